use std::sync::Arc;

use async_trait::async_trait;
use icecream_core::domain::backlog::{BacklogEntry, EntryId};
use icecream_db::{BacklogRepository, RepositoryError};
use icecream_slack::commands::{BacklogCommandService, CommandRouteError};

/// Serves slash commands straight from the backlog repository.
#[derive(Clone)]
pub struct RepositoryCommandService {
    repository: Arc<dyn BacklogRepository>,
}

impl RepositoryCommandService {
    pub fn new(repository: Arc<dyn BacklogRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl BacklogCommandService for RepositoryCommandService {
    async fn add_entry(&self, name: &str) -> Result<EntryId, CommandRouteError> {
        self.repository.add(name).await.map_err(service_error)
    }

    async fn delete_entry(&self, id: EntryId) -> Result<String, CommandRouteError> {
        self.repository.delete(id).await.map_err(service_error)
    }

    async fn list_entries(&self) -> Result<Vec<BacklogEntry>, CommandRouteError> {
        self.repository.list().await.map_err(service_error)
    }
}

fn service_error(error: RepositoryError) -> CommandRouteError {
    CommandRouteError::Service(error.to_string())
}
