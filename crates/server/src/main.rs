mod bootstrap;
mod health;
mod service;
mod webhook;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use icecream_core::config::{sqlite_url_for_path, AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "icecream-server",
    about = "Slack /icecream webhook",
    long_about = "Serve the /icecream slash command, which tracks who owes the team icecream.",
    after_help = "Examples:\n  icecream-server --token xyz\n  icecream-server --addr 127.0.0.1:8080 --db-path /var/lib/icecream.db"
)]
struct Args {
    #[arg(long, help = "Listen address, `host:port` or `:port` (default `:9000`)")]
    addr: Option<String>,
    #[arg(long, help = "Verification token configured for the slash command")]
    token: Option<String>,
    #[arg(long, value_name = "PATH", help = "Path of the store file (default `icecream.db`)")]
    db_path: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Config file (default `icecream.toml` if present)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Log level: trace, debug, info, warn or error")]
    log_level: Option<String>,
}

impl Args {
    fn into_load_options(self) -> LoadOptions {
        let require_file = self.config.is_some();
        LoadOptions {
            config_path: self.config,
            require_file,
            overrides: ConfigOverrides {
                database_url: self.db_path.as_deref().map(sqlite_url_for_path),
                log_level: self.log_level,
                slack_token: self.token,
                listen_address: self.addr,
            },
        }
    }
}

fn init_logging(config: &AppConfig) {
    use icecream_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Args::parse()).await
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(args.into_load_options())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let listen_address = app.config.server.listen_bind_address()?;
    let health_address = app.config.server.health_bind_address()?;

    if let Some(address) = health_address {
        health::spawn(&address, app.db_pool.clone())
            .await
            .with_context(|| format!("failed to bind health endpoint on {address}"))?;
    }

    let listener = tokio::net::TcpListener::bind(listen_address.as_str())
        .await
        .with_context(|| format!("failed to bind webhook listener on {listen_address}"))?;
    let bound = listener.local_addr().context("webhook listener has no local address")?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        listen_address = %bound,
        "icecream-server listening"
    );

    axum::serve(listener, webhook::router(app.webhook.clone()))
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("webhook server terminated unexpectedly")?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "icecream-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
