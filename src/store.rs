//! Summary persistence collaborator interfaces.
//!
//! The final summary is the pipeline's only persisted artifact; everything upstream
//! (extracted text, chunks, segment bullets) is ephemeral. The pipeline performs one
//! trusted write per document and does not retry it; retry policy belongs to the
//! store implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::Mutex;

/// Errors raised by summary stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected or failed the write.
    #[error("failed to persist summary: {0}")]
    Persist(String),
}

/// Durable record handed to the persistence collaborator.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    /// Identifier of the summarized document.
    pub document_id: String,
    /// Final summary text.
    pub summary_text: String,
    /// SHA-256 hash of the source text, usable as an idempotency key.
    pub content_hash: String,
    /// Record schema version.
    pub version: u32,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl SummaryRecord {
    /// Build a version-1 record stamped with the current time.
    pub fn new(document_id: &str, summary_text: &str, content_hash: String) -> Self {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            document_id: document_id.to_string(),
            summary_text: summary_text.to_string(),
            content_hash,
            version: 1,
            created_at,
        }
    }
}

/// Compute the idempotency hash for a document's source text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Interface implemented by persistence collaborators.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Durably store a summary record.
    async fn persist(&self, record: SummaryRecord) -> Result<(), StoreError>;
}

/// In-memory store used by tests and as the default wiring for the binaries.
///
/// Deployments that need durability swap in their own [`SummaryStore`] implementation.
#[derive(Default)]
pub struct MemorySummaryStore {
    records: Mutex<Vec<SummaryRecord>>,
}

impl MemorySummaryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of every record persisted so far.
    pub async fn records(&self) -> Vec<SummaryRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn persist(&self, record: SummaryRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        let first = content_hash("document body");
        let second = content_hash("document body");
        assert_eq!(first, second);
        assert_ne!(first, content_hash("different body"));
        assert_eq!(first.len(), 64);
    }

    #[tokio::test]
    async fn memory_store_keeps_records_in_order() {
        let store = MemorySummaryStore::new();
        store
            .persist(SummaryRecord::new("doc-1", "Summary one", content_hash("a")))
            .await
            .expect("persist");
        store
            .persist(SummaryRecord::new("doc-2", "Summary two", content_hash("b")))
            .await
            .expect("persist");

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].document_id, "doc-1");
        assert_eq!(records[1].document_id, "doc-2");
        assert_eq!(records[0].version, 1);
        assert!(!records[0].created_at.is_empty());
    }
}
