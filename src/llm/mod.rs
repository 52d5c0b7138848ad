//! Language-model backend abstraction used by the summarization pipeline.
//!
//! The pipeline issues three kinds of generation calls (per-chunk, single-pass, and merge)
//! that differ only in prompt and sampling parameters, so a single trait covers all of them.
//! The Ollama-backed adapter issues HTTP requests directly to the runtime's `/api/generate`
//! endpoint with a per-request timeout.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by generation backends.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request exceeded its timeout budget.
    #[error("Generation request timed out after {0:?}")]
    Timeout(Duration),
    /// Backend was unreachable or explicitly disabled.
    #[error("Generation backend unavailable: {0}")]
    ProviderUnavailable(String),
    /// Backend returned an error response.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Backend response could not be parsed.
    #[error("Malformed backend response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Whether this error represents a request timeout.
    ///
    /// Timeouts are the only backend failure the merge stage is allowed to absorb.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Request payload passed to the generation backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully qualified model identifier understood by the backend.
    pub model: String,
    /// Prompt assembled by the summarization pipeline.
    pub prompt: String,
    /// Sampling temperature; the pipeline keeps this low for factual output.
    pub temperature: f32,
    /// Nucleus-sampling parameter.
    pub top_p: f32,
    /// Maximum number of tokens the backend may generate.
    pub max_tokens: u32,
    /// Request-level timeout, shorter than the whole-pipeline budget.
    pub timeout: Duration,
}

/// Interface implemented by generation backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate text for the supplied prompt and sampling parameters.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Build the generation backend from configuration.
pub fn get_llm_backend() -> Arc<dyn LlmBackend> {
    let config = get_config();
    Arc::new(OllamaBackend::new(config.ollama_url.clone()))
}

/// Generation backend speaking the Ollama `/api/generate` protocol.
pub struct OllamaBackend {
    http: Client,
    base_url: String,
}

impl OllamaBackend {
    /// Construct a backend targeting the given Ollama base URL.
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/llm")
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self { http, base_url }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "top_p": request.top_p,
                "num_predict": request.max_tokens,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    GenerationError::Timeout(request.timeout)
                } else {
                    GenerationError::ProviderUnavailable(format!(
                        "failed to reach Ollama at {}: {error}",
                        self.base_url
                    ))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GenerationError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                GenerationError::Timeout(request.timeout)
            } else {
                GenerationError::InvalidResponse(format!(
                    "failed to decode Ollama response: {error}"
                ))
            }
        })?;

        if !body.done {
            return Err(GenerationError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
