use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};
use tracing::debug;

use icecream_core::domain::backlog::{BacklogEntry, EntryId};

use super::{BacklogRepository, BucketSummary, RepositoryError};
use crate::DbPool;

pub struct SqlBacklogRepository {
    pool: DbPool,
    bucket: String,
}

impl SqlBacklogRepository {
    pub fn new(pool: DbPool, bucket: impl Into<String>) -> Self {
        Self { pool, bucket: bucket.into() }
    }

    /// Sequence and entry count, or `None` while the bucket has never been written.
    pub async fn summary(&self) -> Result<Option<BucketSummary>, RepositoryError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT b.sequence, COUNT(e.entry_key)
             FROM bucket b
             LEFT JOIN bucket_entry e ON e.bucket_name = b.name
             WHERE b.name = ?
             GROUP BY b.name, b.sequence",
        )
        .bind(&self.bucket)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(sequence, entries)| {
            Ok(BucketSummary {
                sequence: parse_sequence(sequence)?,
                entries: parse_sequence(entries)?,
            })
        })
        .transpose()
    }

    async fn ensure_bucket(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO bucket (name, sequence) VALUES (?, 0) ON CONFLICT(name) DO NOTHING")
            .bind(&self.bucket)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BacklogRepository for SqlBacklogRepository {
    async fn add(&self, name: &str) -> Result<EntryId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // First statement writes, so the transaction takes the write lock up front.
        self.ensure_bucket(&mut tx).await?;

        let sequence: i64 = sqlx::query_scalar(
            "UPDATE bucket SET sequence = sequence + 1 WHERE name = ? RETURNING sequence",
        )
        .bind(&self.bucket)
        .fetch_one(&mut *tx)
        .await?;
        let id = EntryId(parse_sequence(sequence)?);

        sqlx::query(
            "INSERT INTO bucket_entry (bucket_name, entry_key, entry_value) VALUES (?, ?, ?)",
        )
        .bind(&self.bucket)
        .bind(id.to_key_bytes().to_vec())
        .bind(name.as_bytes().to_vec())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(bucket = %self.bucket, entry_id = %id, "backlog entry stored");
        Ok(id)
    }

    async fn delete(&self, id: EntryId) -> Result<String, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        self.ensure_bucket(&mut tx).await?;

        let key = id.to_key_bytes().to_vec();
        let stored: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT entry_value FROM bucket_entry WHERE bucket_name = ? AND entry_key = ?",
        )
        .bind(&self.bucket)
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bucket_entry WHERE bucket_name = ? AND entry_key = ?")
            .bind(&self.bucket)
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let name = stored.map(decode_name).transpose()?.unwrap_or_default();
        debug!(bucket = %self.bucket, entry_id = %id, found = !name.is_empty(), "backlog entry removed");
        Ok(name)
    }

    async fn list(&self) -> Result<Vec<BacklogEntry>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT name FROM bucket WHERE name = ?")
            .bind(&self.bucket)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Err(RepositoryError::BucketNotFound(self.bucket.clone()));
        }

        let rows = sqlx::query(
            "SELECT entry_key, entry_value
             FROM bucket_entry
             WHERE bucket_name = ?
             ORDER BY entry_key ASC",
        )
        .bind(&self.bucket)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: SqliteRow) -> Result<BacklogEntry, RepositoryError> {
    let key = row.try_get::<Vec<u8>, _>("entry_key")?;
    let id = EntryId::from_key_bytes(&key).ok_or_else(|| {
        RepositoryError::Decode(format!("entry key must be 8 bytes, found {}", key.len()))
    })?;
    let name = decode_name(row.try_get::<Vec<u8>, _>("entry_value")?)?;

    Ok(BacklogEntry { id, name })
}

fn decode_name(value: Vec<u8>) -> Result<String, RepositoryError> {
    String::from_utf8(value)
        .map_err(|error| RepositoryError::Decode(format!("entry value is not UTF-8: {error}")))
}

fn parse_sequence(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!("invalid bucket sequence (expected non-negative): {value}"))
    })
}
