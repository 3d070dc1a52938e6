use async_trait::async_trait;
use thiserror::Error;

use icecream_core::domain::backlog::{BacklogEntry, EntryId};

pub mod bucket;
pub mod memory;

pub use bucket::SqlBacklogRepository;
pub use memory::InMemoryBacklogRepository;

/// Bucket holding the owing backlog.
pub const DEFAULT_BUCKET: &str = "icecream";

/// Counter and size of an existing bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketSummary {
    /// Last id handed out; deleted ids still count.
    pub sequence: u64,
    pub entries: u64,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("bucket `{0}` does not exist")]
    BucketNotFound(String),
}

/// Durable id → name store backed by a single bucket.
///
/// Every call runs in its own transaction. Ids come from the bucket's sequence,
/// so they increase strictly and are never handed out twice.
#[async_trait]
pub trait BacklogRepository: Send + Sync {
    /// Creates the bucket if needed and stores `name` under the next id.
    async fn add(&self, name: &str) -> Result<EntryId, RepositoryError>;

    /// Removes `id`, returning the stored name or an empty string when absent.
    async fn delete(&self, id: EntryId) -> Result<String, RepositoryError>;

    /// All entries in ascending id order. Fails until the bucket has been written.
    async fn list(&self) -> Result<Vec<BacklogEntry>, RepositoryError>;
}
