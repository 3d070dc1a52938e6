use std::collections::BTreeMap;

use tokio::sync::RwLock;

use icecream_core::domain::backlog::{BacklogEntry, EntryId};

use super::{BacklogRepository, RepositoryError, DEFAULT_BUCKET};

#[derive(Default)]
struct MemoryBucket {
    sequence: u64,
    entries: BTreeMap<EntryId, String>,
}

/// Process-local backlog with the same bucket semantics as the SQL store.
#[derive(Default)]
pub struct InMemoryBacklogRepository {
    bucket: RwLock<Option<MemoryBucket>>,
}

#[async_trait::async_trait]
impl BacklogRepository for InMemoryBacklogRepository {
    async fn add(&self, name: &str) -> Result<EntryId, RepositoryError> {
        let mut guard = self.bucket.write().await;
        let bucket = guard.get_or_insert_with(MemoryBucket::default);
        bucket.sequence += 1;
        let id = EntryId(bucket.sequence);
        bucket.entries.insert(id, name.to_owned());
        Ok(id)
    }

    async fn delete(&self, id: EntryId) -> Result<String, RepositoryError> {
        let mut guard = self.bucket.write().await;
        let bucket = guard.get_or_insert_with(MemoryBucket::default);
        Ok(bucket.entries.remove(&id).unwrap_or_default())
    }

    async fn list(&self) -> Result<Vec<BacklogEntry>, RepositoryError> {
        let guard = self.bucket.read().await;
        let bucket =
            guard.as_ref().ok_or_else(|| RepositoryError::BucketNotFound(DEFAULT_BUCKET.into()))?;
        Ok(bucket.entries.iter().map(|(id, name)| BacklogEntry::new(*id, name.clone())).collect())
    }
}
