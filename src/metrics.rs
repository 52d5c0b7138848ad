use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    chunk_failures: AtomicU64,
    degraded_merges: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized document with its chunk counts.
    ///
    /// Single-pass documents record zero chunks.
    pub fn record_document(&self, chunk_count: u64, chunk_failures: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(chunk_failures, Ordering::Relaxed);
    }

    /// Record a merge call that timed out and degraded to the bullet fallback.
    pub fn record_degraded_merge(&self) {
        self.degraded_merges.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            degraded_merges: self.degraded_merges.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Total chunk count processed across all chunked documents.
    pub chunks_summarized: u64,
    /// Chunk-summarization calls that failed and were replaced by sentinels.
    pub chunk_failures: u64,
    /// Merge calls that timed out and fell back to combined bullets.
    pub degraded_merges: u64,
}
