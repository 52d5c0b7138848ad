//! HTTP surface for DocDigest.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /summarize` – Run the two-stage summarization pipeline over raw text and
//!   persist the resulting summary. Returns the summary together with pipeline
//!   diagnostics (`chunk_count`, `path`, `degraded`).
//! - `GET /metrics` – Observe pipeline counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline service with the CLI, so behavior is
//! identical across interfaces.

use crate::pipeline::{PipelineError, SummaryApi, SummaryError};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /summarize` endpoint.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Already-extracted document text to summarize.
    text: String,
    /// Optional document identifier; generated when absent.
    #[serde(default)]
    document_id: Option<String>,
}

/// Success response for the `POST /summarize` endpoint.
#[derive(Serialize)]
struct SummarizeResponse {
    /// Identifier the summary was persisted under.
    document_id: String,
    /// Final summary text.
    summary: String,
    /// Number of chunks processed (0 on the single-pass path).
    chunk_count: usize,
    /// Which pipeline path produced the summary (`single_pass` | `chunked`).
    path: &'static str,
    /// Whether the merge stage degraded to combined bullets.
    degraded: bool,
}

/// Summarize raw text and persist the result.
///
/// This handler accepts already-extracted text, normalizes and (when long enough)
/// chunks it, fans out per-chunk summarization, and synthesizes the final summary.
async fn summarize_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: SummaryApi,
{
    let SummarizeRequest { text, document_id } = request;
    let document_id = document_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let outcome = service.summarize(&document_id, &text).await?;
    tracing::info!(
        document = %document_id,
        path = outcome.path.as_str(),
        chunks = outcome.chunk_count,
        degraded = outcome.degraded,
        "Summarize request completed"
    );
    Ok(Json(SummarizeResponse {
        document_id,
        summary: outcome.summary,
        chunk_count: outcome.chunk_count,
        path: outcome.path.as_str(),
        degraded: outcome.degraded,
    }))
}

/// Return a concise metrics snapshot with pipeline counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Summarize raw document text with the two-stage pipeline and persist the result. Response returns { \"summary\": string, \"chunk_count\": number, \"path\": string, \"degraded\": bool }.",
                request_example: Some(json!({
                    "text": "Document contents",
                    "document_id": "optional-identifier"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::Summary(SummaryError::EmptyInput | SummaryError::EmptySummary) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
