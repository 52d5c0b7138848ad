//! Ephemeral processing-status reporting.
//!
//! Status is an external projection of pipeline progress: the pipeline only emits
//! transition requests and never reads status back. Sinks are fire-and-forget so a
//! slow or broken status store can never stall summarization.

use async_trait::async_trait;
use std::fmt;

/// Coarse pipeline phases reported to the status sink.
///
/// Per invocation the sequence is `pending -> extracting -> summarizing -> {complete | error}`.
/// `extracting` only appears when the caller supplies a source requiring upstream extraction;
/// callers handing over already-extracted text start at `summarizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPhase {
    /// Work accepted but not started; emitted by upstream intake, not by the pipeline.
    Pending,
    /// Source bytes or URL content are being turned into plain text.
    Extracting,
    /// The summarization pipeline is running.
    Summarizing,
    /// Terminal: a usable summary was produced (possibly degraded).
    Complete,
    /// Terminal: the pipeline failed; the message carries the cause.
    Error,
}

impl ProcessingPhase {
    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Summarizing => "summarizing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status transition emitted by the pipeline.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    /// Identifier of the document or job the transition belongs to.
    pub subject: String,
    /// Phase the subject has entered.
    pub phase: ProcessingPhase,
    /// Coarse progress percentage associated with the phase.
    pub progress: u8,
    /// Optional human-readable note for the transition.
    pub message: Option<String>,
}

/// Interface implemented by status stores.
///
/// Implementations must tolerate duplicate or out-of-order delivery; the pipeline
/// never awaits acknowledgement beyond the call itself.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Record a status transition for a subject.
    async fn update(&self, update: StatusUpdate);
}

/// Status sink that routes transitions through tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusSink;

#[async_trait]
impl StatusSink for LogStatusSink {
    async fn update(&self, update: StatusUpdate) {
        tracing::info!(
            subject = %update.subject,
            phase = update.phase.as_str(),
            progress = update.progress,
            message = update.message.as_deref().unwrap_or(""),
            "Status transition"
        );
    }
}

/// Status sink that discards all transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusSink;

#[async_trait]
impl StatusSink for NullStatusSink {
    async fn update(&self, _update: StatusUpdate) {}
}
