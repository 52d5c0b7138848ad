//! Core data types and error definitions for the summarization pipeline.

use crate::{
    config::{self, Config},
    extract::ExtractError,
    llm::GenerationError,
    store::StoreError,
};
use std::time::Duration;
use thiserror::Error;

/// A contiguous, possibly overlapping segment of normalized text.
///
/// Chunks are ephemeral: produced by the splitter, consumed once by the segment
/// summarizer, never persisted. `index` is the chunk's position in document order
/// and is the sole ordering used downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within the document.
    pub index: usize,
    /// Trimmed text span drawn from the normalized document.
    pub text: String,
}

/// Outcome of summarizing one chunk: either a genuine bullet summary or a sentinel
/// marking the failed chunk, so the ordered collection never has gaps.
#[derive(Debug, Clone)]
pub struct SegmentSummary {
    /// Index of the chunk this summary belongs to.
    pub index: usize,
    /// Bullet-formatted summary text, or the failure sentinel.
    pub text: String,
    /// Whether the backend call failed and `text` holds the sentinel.
    pub failed: bool,
}

/// Which control path produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPath {
    /// The document was short enough to summarize in one backend call.
    SinglePass,
    /// The document went through chunking, fan-out, and synthesis.
    Chunked,
}

impl SummaryPath {
    /// Wire name of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SinglePass => "single_pass",
            Self::Chunked => "chunked",
        }
    }
}

/// Result of a completed summarization produced by
/// [`crate::pipeline::SummaryService::generate_summary`].
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    /// Final summary text; non-empty on success.
    pub summary: String,
    /// Number of chunks processed (zero on the single-pass path).
    pub chunk_count: usize,
    /// Control path that produced the summary.
    pub path: SummaryPath,
    /// Whether the merge stage timed out and fell back to combined bullets.
    pub degraded: bool,
}

/// Tunable knobs for the summarization pipeline.
///
/// Loaded from configuration in the binaries; tests construct these directly. The
/// thresholds and the chars-per-token ratio are approximations tuned per model
/// family, which is why they are configuration rather than constants.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Model identifier passed to the generation backend.
    pub model: String,
    /// Character cap applied during normalization.
    pub max_input_chars: usize,
    /// Character count below which the single-pass path is taken.
    pub short_text_threshold: usize,
    /// Token budget per chunk.
    pub chunk_tokens: usize,
    /// Token overlap between adjacent chunks.
    pub overlap_tokens: usize,
    /// Approximate characters per token for budget conversion.
    pub chars_per_token: usize,
    /// Concurrency cap for the chunk-summarization worker pool.
    pub workers: usize,
    /// Timeout for each per-chunk generation call.
    pub chunk_timeout: Duration,
    /// Timeout for merge and single-pass generation calls.
    pub merge_timeout: Duration,
}

impl SummaryOptions {
    /// Build pipeline options from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.summary_model.clone(),
            max_input_chars: config.max_input_chars,
            short_text_threshold: config.short_text_threshold,
            chunk_tokens: config.chunk_tokens,
            overlap_tokens: config.chunk_overlap_tokens,
            chars_per_token: config.chars_per_token,
            workers: config.summary_workers,
            chunk_timeout: Duration::from_secs(config.chunk_timeout_secs),
            merge_timeout: Duration::from_secs(config.merge_timeout_secs),
        }
    }
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            model: config::DEFAULT_SUMMARY_MODEL.to_string(),
            max_input_chars: config::DEFAULT_MAX_INPUT_CHARS,
            short_text_threshold: config::DEFAULT_SHORT_TEXT_THRESHOLD,
            chunk_tokens: config::DEFAULT_CHUNK_TOKENS,
            overlap_tokens: config::DEFAULT_CHUNK_OVERLAP_TOKENS,
            chars_per_token: config::DEFAULT_CHARS_PER_TOKEN,
            workers: config::DEFAULT_SUMMARY_WORKERS,
            chunk_timeout: Duration::from_secs(config::DEFAULT_CHUNK_TIMEOUT_SECS),
            merge_timeout: Duration::from_secs(config::DEFAULT_MERGE_TIMEOUT_SECS),
        }
    }
}

/// Pipeline-fatal summarization errors.
///
/// Per-chunk failures and merge timeouts are absorbed into the output (sentinel
/// bullets, degraded fallback) and never appear here.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Normalized input text was empty or whitespace-only.
    #[error("document produced no text to summarize")]
    EmptyInput,
    /// The backend returned an empty or whitespace-only summary.
    #[error("summary generation produced no content")]
    EmptySummary,
    /// Merge or single-pass generation failed for a non-recoverable reason.
    #[error("failed to synthesize summary: {0}")]
    Synthesis(#[source] GenerationError),
}

/// Errors emitted by the document-level processing flows.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extraction collaborator failed to derive text from the source.
    #[error("Failed to extract text: {0}")]
    Extraction(#[from] ExtractError),
    /// Summarization pipeline failed.
    #[error("Failed to generate summary: {0}")]
    Summary(#[from] SummaryError),
    /// Persistence collaborator rejected the summary write.
    #[error("Failed to store summary: {0}")]
    Store(#[from] StoreError),
}
