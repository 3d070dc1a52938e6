//! Readiness check for the backlog store, served on its own port.
//!
//! The store is ready once it answers queries and every embedded migration has
//! been applied. A missing bucket is reported but is not a failure: it only
//! means nobody has run `add` or `del` yet.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use icecream_db::{migrations, DbPool, SqlBacklogRepository, DEFAULT_BUCKET};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    repository: Arc<SqlBacklogRepository>,
}

impl HealthState {
    pub fn new(db_pool: DbPool) -> Self {
        let repository = Arc::new(SqlBacklogRepository::new(db_pool.clone(), DEFAULT_BUCKET));
        Self { db_pool, repository }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    pub name: &'static str,
    pub exists: bool,
    pub sequence: Option<u64>,
    pub entries: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub reachable: bool,
    pub pending_migrations: Vec<i64>,
    pub bucket: Option<BucketReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: Readiness,
    pub store: StoreReport,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState::new(db_pool))
}

/// Binds the health listener and serves it on a background task.
pub async fn spawn(address: &str, db_pool: DbPool) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    let bound = listener.local_addr()?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %bound,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let store = inspect_store(&state).await;
    let ready = store.reachable && store.pending_migrations.is_empty();
    if !ready {
        warn!(
            event_name = "system.health.degraded",
            correlation_id = "health",
            reachable = store.reachable,
            pending_migrations = store.pending_migrations.len(),
            "store is not ready"
        );
    }

    let report = HealthReport {
        status: if ready { Readiness::Ready } else { Readiness::Degraded },
        store,
        checked_at: Utc::now().to_rfc3339(),
    };
    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(report))
}

async fn inspect_store(state: &HealthState) -> StoreReport {
    let pending_migrations = match migrations::pending_versions(&state.db_pool).await {
        Ok(pending) => pending,
        Err(error) => {
            return StoreReport {
                reachable: false,
                pending_migrations: Vec::new(),
                bucket: None,
                error: Some(error.to_string()),
            }
        }
    };

    // Without the schema there is no bucket table to look at.
    if !pending_migrations.is_empty() {
        return StoreReport { reachable: true, pending_migrations, bucket: None, error: None };
    }

    match state.repository.summary().await {
        Ok(summary) => StoreReport {
            reachable: true,
            pending_migrations,
            bucket: Some(BucketReport {
                name: DEFAULT_BUCKET,
                exists: summary.is_some(),
                sequence: summary.map(|summary| summary.sequence),
                entries: summary.map(|summary| summary.entries),
            }),
            error: None,
        },
        Err(error) => StoreReport {
            reachable: false,
            pending_migrations,
            bucket: None,
            error: Some(error.to_string()),
        },
    }
}
