use std::sync::Arc;

use icecream_core::config::{AppConfig, ConfigError};
use icecream_db::{connect_with_settings, migrations, DbPool, SqlBacklogRepository, DEFAULT_BUCKET};
use icecream_slack::verification::TokenVerifier;
use thiserror::Error;
use tracing::info;

use crate::service::RepositoryCommandService;
use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub webhook: WebhookState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        database_url = %config.database.url,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let repository = SqlBacklogRepository::new(db_pool.clone(), DEFAULT_BUCKET);
    let webhook = WebhookState::new(
        TokenVerifier::new(config.slack.token.clone()),
        RepositoryCommandService::new(Arc::new(repository)),
    );

    Ok(Application { config, db_pool, webhook })
}

#[cfg(test)]
mod tests {
    use icecream_core::config::{sqlite_url_for_path, AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn overrides(database_url: String, token: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url),
                slack_token: Some(token.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_slack_token() {
        let result = bootstrap(overrides("sqlite::memory:".to_string(), "")).await;

        let error = result.err().expect("empty token must be rejected");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("slack.token"));
    }

    #[tokio::test]
    async fn bootstrap_creates_store_file_and_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("icecream.db");

        let app = bootstrap(overrides(sqlite_url_for_path(&path), "xyz"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        assert!(path.exists(), "store file should be created on first run");
        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('bucket', 'bucket_entry')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 2);

        let (bucket_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bucket")
            .fetch_one(&app.db_pool)
            .await
            .expect("bucket query");
        assert_eq!(bucket_count, 0, "bucket is created by the first mutation, not at startup");

        app.db_pool.close().await;
    }
}
