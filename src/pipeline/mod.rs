//! Two-stage map/reduce summarization pipeline.
//!
//! Raw text is normalized, split into overlapping sentence-aligned chunks, summarized
//! per chunk (concurrently for larger documents), and synthesized into one final
//! summary. Short documents skip chunking entirely and take a single-pass path.

/// Chunk splitting with sentence-boundary alignment and overlap bookkeeping.
pub mod chunking;
/// Whitespace normalization and length capping for raw extracted text.
pub mod normalize;
mod prompts;
mod service;
mod summarize;
/// Core data types and error definitions for the pipeline.
pub mod types;

pub use service::{SummaryApi, SummaryService};
pub use types::{
    Chunk, PipelineError, SegmentSummary, SummaryError, SummaryOptions, SummaryOutcome,
    SummaryPath,
};
