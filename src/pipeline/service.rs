//! Summarization service coordinating normalization, chunking, fan-out, and synthesis.

use crate::{
    extract::{ExtractError, SourceRef, TextExtractor},
    llm::LlmBackend,
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        chunking::split_text,
        normalize::normalize,
        summarize::{merge_summaries, single_pass_summary, summarize_all},
        types::{PipelineError, SummaryError, SummaryOptions, SummaryOutcome, SummaryPath},
    },
    status::{ProcessingPhase, StatusSink, StatusUpdate},
    store::{SummaryRecord, SummaryStore, content_hash},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the full summarization pipeline for one document at a time.
///
/// The service owns long-lived handles to the generation backend, the persistence
/// collaborator, the status sink, and the metrics registry so that both the HTTP
/// surface and the CLI reuse the same components. Construct the service once near
/// process start and share it through an `Arc`; collaborators are injected so tests
/// substitute stubs freely.
pub struct SummaryService {
    backend: Arc<dyn LlmBackend>,
    store: Arc<dyn SummaryStore>,
    status: Arc<dyn StatusSink>,
    metrics: Arc<PipelineMetrics>,
    options: SummaryOptions,
}

/// Abstraction over the summarization pipeline used by external surfaces.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Summarize already-extracted text and persist the result.
    async fn summarize(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<SummaryOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummaryService {
    /// Build a new summarization service from its collaborators.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn SummaryStore>,
        status: Arc<dyn StatusSink>,
        options: SummaryOptions,
    ) -> Self {
        Self {
            backend,
            store,
            status,
            metrics: Arc::new(PipelineMetrics::new()),
            options,
        }
    }

    /// Run the two-stage summarization pipeline over raw text.
    ///
    /// Normalizes the input, then either summarizes it in a single pass (strictly
    /// below the short-text threshold; text exactly at the threshold is chunked) or
    /// splits it and runs fan-out plus synthesis. Emits no status transitions; the
    /// document-level flows own those.
    pub async fn generate_summary(&self, raw_text: &str) -> Result<SummaryOutcome, SummaryError> {
        let normalized = normalize(raw_text, self.options.max_input_chars);
        if normalized.trim().is_empty() {
            return Err(SummaryError::EmptyInput);
        }

        let length = normalized.chars().count();
        let mut chunk_failures = 0usize;
        let outcome = if length < self.options.short_text_threshold {
            tracing::debug!(chars = length, "Short document; single-pass summarization");
            let summary = single_pass_summary(self.backend.as_ref(), &normalized, &self.options).await?;
            SummaryOutcome {
                summary,
                chunk_count: 0,
                path: SummaryPath::SinglePass,
                degraded: false,
            }
        } else {
            let chunks = split_text(
                &normalized,
                self.options.chunk_tokens,
                self.options.overlap_tokens,
                self.options.chars_per_token,
            );
            tracing::debug!(
                chars = length,
                chunks = chunks.len(),
                workers = self.options.workers,
                "Chunked summarization"
            );
            let summaries = summarize_all(&self.backend, &chunks, &self.options).await;
            chunk_failures = summaries.iter().filter(|summary| summary.failed).count();
            let merged = merge_summaries(self.backend.as_ref(), &summaries, &self.options).await?;
            if merged.degraded {
                self.metrics.record_degraded_merge();
            }
            SummaryOutcome {
                summary: merged.text,
                chunk_count: chunks.len(),
                path: SummaryPath::Chunked,
                degraded: merged.degraded,
            }
        };

        if outcome.summary.trim().is_empty() {
            return Err(SummaryError::EmptySummary);
        }

        self.metrics
            .record_document(outcome.chunk_count as u64, chunk_failures as u64);
        Ok(outcome)
    }

    /// Summarize already-extracted text, reporting status and persisting the result.
    ///
    /// Callers handing over plain text start directly at the `summarizing` phase.
    pub async fn summarize_text(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<SummaryOutcome, PipelineError> {
        self.report(
            document_id,
            ProcessingPhase::Summarizing,
            50,
            "Generating summary",
        )
        .await;
        let result = self.run_summary(document_id, text).await;
        self.finish(document_id, result).await
    }

    /// Extract text from a source, then summarize and persist it.
    ///
    /// Drives the full `extracting -> summarizing -> {complete | error}` sequence.
    pub async fn summarize_document(
        &self,
        document_id: &str,
        extractor: &dyn TextExtractor,
        source: &SourceRef,
    ) -> Result<SummaryOutcome, PipelineError> {
        self.report(
            document_id,
            ProcessingPhase::Extracting,
            40,
            "Extracting text from source",
        )
        .await;

        let text = match extractor.extract(source).await {
            Ok(text) if text.trim().is_empty() => {
                let error = PipelineError::from(ExtractError::NoText);
                self.report_error(document_id, &error).await;
                return Err(error);
            }
            Ok(text) => text,
            Err(error) => {
                let error = PipelineError::from(error);
                self.report_error(document_id, &error).await;
                return Err(error);
            }
        };

        self.report(
            document_id,
            ProcessingPhase::Summarizing,
            70,
            "Generating summary",
        )
        .await;
        let result = self.run_summary(document_id, &text).await;
        self.finish(document_id, result).await
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn run_summary(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<SummaryOutcome, PipelineError> {
        let outcome = self.generate_summary(text).await?;
        let record = SummaryRecord::new(document_id, &outcome.summary, content_hash(text));
        self.store.persist(record).await?;
        tracing::info!(
            document = document_id,
            path = outcome.path.as_str(),
            chunks = outcome.chunk_count,
            degraded = outcome.degraded,
            "Summary persisted"
        );
        Ok(outcome)
    }

    async fn finish(
        &self,
        document_id: &str,
        result: Result<SummaryOutcome, PipelineError>,
    ) -> Result<SummaryOutcome, PipelineError> {
        match result {
            Ok(outcome) => {
                self.report(
                    document_id,
                    ProcessingPhase::Complete,
                    100,
                    "Summary generated successfully",
                )
                .await;
                Ok(outcome)
            }
            Err(error) => {
                self.report_error(document_id, &error).await;
                Err(error)
            }
        }
    }

    async fn report(&self, subject: &str, phase: ProcessingPhase, progress: u8, message: &str) {
        self.status
            .update(StatusUpdate {
                subject: subject.to_string(),
                phase,
                progress,
                message: Some(message.to_string()),
            })
            .await;
    }

    async fn report_error(&self, subject: &str, error: &PipelineError) {
        self.status
            .update(StatusUpdate {
                subject: subject.to_string(),
                phase: ProcessingPhase::Error,
                progress: 0,
                message: Some(error.to_string()),
            })
            .await;
    }
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<SummaryOutcome, PipelineError> {
        SummaryService::summarize_text(self, document_id, text).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummaryService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationError, GenerationRequest};
    use crate::store::MemorySummaryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend whose reply is chosen per prompt; records every prompt.
    struct ScriptedBackend {
        calls: Mutex<Vec<String>>,
        script: Box<dyn Fn(&str) -> Result<String, GenerationError> + Send + Sync>,
    }

    impl ScriptedBackend {
        fn new(
            script: impl Fn(&str) -> Result<String, GenerationError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                script: Box::new(script),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(request.prompt.clone());
            (self.script)(&request.prompt)
        }
    }

    #[derive(Default)]
    struct RecordingStatusSink {
        events: Mutex<Vec<(ProcessingPhase, u8)>>,
    }

    impl RecordingStatusSink {
        fn events(&self) -> Vec<(ProcessingPhase, u8)> {
            self.events.lock().expect("events lock").clone()
        }
    }

    #[async_trait]
    impl StatusSink for RecordingStatusSink {
        async fn update(&self, update: StatusUpdate) {
            self.events
                .lock()
                .expect("events lock")
                .push((update.phase, update.progress));
        }
    }

    struct StubExtractor {
        text: Option<String>,
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, _source: &SourceRef) -> Result<String, ExtractError> {
            self.text.clone().ok_or(ExtractError::NoText)
        }
    }

    struct Harness {
        service: SummaryService,
        backend: Arc<ScriptedBackend>,
        store: Arc<MemorySummaryStore>,
        status: Arc<RecordingStatusSink>,
    }

    fn harness(
        options: SummaryOptions,
        script: impl Fn(&str) -> Result<String, GenerationError> + Send + Sync + 'static,
    ) -> Harness {
        let backend = ScriptedBackend::new(script);
        let store = Arc::new(MemorySummaryStore::new());
        let status = Arc::new(RecordingStatusSink::default());
        let service = SummaryService::new(
            backend.clone(),
            store.clone(),
            status.clone(),
            options,
        );
        Harness {
            service,
            backend,
            store,
            status,
        }
    }

    /// Options with small budgets so tests exercise the chunked path cheaply.
    fn tiny_options() -> SummaryOptions {
        SummaryOptions {
            short_text_threshold: 40,
            chunk_tokens: 10,
            overlap_tokens: 2,
            chars_per_token: 4,
            workers: 2,
            ..SummaryOptions::default()
        }
    }

    fn sentences(count: usize) -> String {
        (0..count)
            .map(|i| format!("Fact number {i} appears in the document."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn short_text_takes_single_pass_path() {
        let h = harness(tiny_options(), |_| Ok("A tidy summary.".into()));

        let outcome = h
            .service
            .generate_summary("Photosynthesis basics.")
            .await
            .expect("summary");

        assert_eq!(outcome.path, SummaryPath::SinglePass);
        assert_eq!(outcome.chunk_count, 0);
        assert_eq!(outcome.summary, "A tidy summary.");
        let calls = h.backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Document:"));
        assert!(calls[0].contains("Summary:"));
    }

    #[tokio::test]
    async fn text_at_threshold_takes_chunked_path() {
        let h = harness(tiny_options(), |prompt| {
            if prompt.contains("Key Points from Document:") {
                Ok("Merged.".into())
            } else {
                Ok("• point".into())
            }
        });
        // exactly at the threshold: the single-pass comparison is strict
        let text = "a".repeat(40);

        let outcome = h.service.generate_summary(&text).await.expect("summary");

        assert_eq!(outcome.path, SummaryPath::Chunked);
        assert!(outcome.chunk_count >= 1);
        assert_eq!(outcome.summary, "Merged.");
    }

    #[tokio::test]
    async fn empty_input_fails_without_backend_calls() {
        let h = harness(tiny_options(), |_| Ok("unused".into()));

        let error = h
            .service
            .generate_summary("   \n  \t ")
            .await
            .expect_err("empty input");

        assert!(matches!(error, SummaryError::EmptyInput));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_backend_reply_is_rejected() {
        let h = harness(tiny_options(), |_| Ok("   ".into()));

        let error = h
            .service
            .generate_summary("Short note.")
            .await
            .expect_err("blank summary");

        assert!(matches!(error, SummaryError::EmptySummary));
    }

    #[tokio::test]
    async fn degraded_merge_still_completes() {
        let h = harness(tiny_options(), |prompt| {
            if prompt.contains("Key Points from Document:") {
                Err(GenerationError::Timeout(Duration::from_secs(1)))
            } else {
                Ok("• bullet".into())
            }
        });
        let text = sentences(8);

        let outcome = h
            .service
            .summarize_text("doc-1", &text)
            .await
            .expect("degraded outcome");

        assert!(outcome.degraded);
        assert!(outcome.summary.starts_with("Key Points:"));
        assert!(outcome.summary.contains("• bullet"));
        let events = h.status.events();
        assert_eq!(
            events,
            vec![
                (ProcessingPhase::Summarizing, 50),
                (ProcessingPhase::Complete, 100)
            ]
        );
    }

    #[tokio::test]
    async fn fatal_merge_error_reports_error_status() {
        let h = harness(tiny_options(), |prompt| {
            if prompt.contains("Key Points from Document:") {
                Err(GenerationError::ProviderUnavailable("down".into()))
            } else {
                Ok("• bullet".into())
            }
        });
        let text = sentences(8);

        let error = h
            .service
            .summarize_text("doc-1", &text)
            .await
            .expect_err("fatal merge");

        assert!(matches!(
            error,
            PipelineError::Summary(SummaryError::Synthesis(_))
        ));
        let events = h.status.events();
        assert_eq!(events[0], (ProcessingPhase::Summarizing, 50));
        assert_eq!(events[1], (ProcessingPhase::Error, 0));
        assert!(h.store.records().await.is_empty());
    }

    #[tokio::test]
    async fn summarize_text_persists_record() {
        let h = harness(tiny_options(), |_| Ok("A tidy summary.".into()));

        h.service
            .summarize_text("doc-42", "Short note.")
            .await
            .expect("outcome");

        let records = h.store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_id, "doc-42");
        assert_eq!(records[0].summary_text, "A tidy summary.");
        assert_eq!(records[0].content_hash, content_hash("Short note."));
        assert_eq!(records[0].version, 1);
    }

    #[tokio::test]
    async fn summarize_document_drives_extraction_phases() {
        let h = harness(tiny_options(), |_| Ok("A tidy summary.".into()));
        let extractor = StubExtractor {
            text: Some("Extracted body.".into()),
        };

        let outcome = h
            .service
            .summarize_document(
                "doc-7",
                &extractor,
                &SourceRef::Url("https://example.org".into()),
            )
            .await
            .expect("outcome");

        assert_eq!(outcome.path, SummaryPath::SinglePass);
        let events = h.status.events();
        assert_eq!(
            events,
            vec![
                (ProcessingPhase::Extracting, 40),
                (ProcessingPhase::Summarizing, 70),
                (ProcessingPhase::Complete, 100)
            ]
        );
    }

    #[tokio::test]
    async fn extraction_failure_reports_error_without_backend_calls() {
        let h = harness(tiny_options(), |_| Ok("unused".into()));
        let extractor = StubExtractor { text: None };

        let error = h
            .service
            .summarize_document(
                "doc-8",
                &extractor,
                &SourceRef::Url("https://example.org".into()),
            )
            .await
            .expect_err("no text");

        assert!(matches!(
            error,
            PipelineError::Extraction(ExtractError::NoText)
        ));
        assert!(h.backend.calls().is_empty());
        let events = h.status.events();
        assert_eq!(events[0], (ProcessingPhase::Extracting, 40));
        assert_eq!(events[1], (ProcessingPhase::Error, 0));
    }

    #[tokio::test]
    async fn failed_chunk_appears_as_sentinel_in_merge_input() {
        let h = harness(tiny_options(), move |prompt| {
            if prompt.contains("Key Points from Document:") {
                Ok("Merged.".into())
            } else if prompt.contains("Fact number 2") {
                Err(GenerationError::GenerationFailed("backend down".into()))
            } else {
                Ok("• fine".into())
            }
        });
        let text = sentences(8);

        let outcome = h
            .service
            .summarize_text("doc-9", &text)
            .await
            .expect("outcome despite chunk failure");

        assert!(!outcome.summary.is_empty());
        let merge_call = h
            .backend
            .calls()
            .into_iter()
            .find(|prompt| prompt.contains("Key Points from Document:"))
            .expect("merge prompt");
        assert!(merge_call.contains("unavailable"));
        assert!(merge_call.contains("• fine"));
        assert_eq!(
            h.status.events().last(),
            Some(&(ProcessingPhase::Complete, 100))
        );
        assert!(h.service.metrics_snapshot().chunk_failures >= 1);
    }
}
