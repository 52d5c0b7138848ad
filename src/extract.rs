//! Text-extraction collaborator interfaces.
//!
//! Format-specific extraction (PDF, OCR, transcription) lives outside this service; the
//! pipeline only ever sees the resulting plain text. The one extractor shipped here is the
//! readability adapter for URL sources, which delegates the heavy lifting to a hosted
//! reader endpoint and returns cleaned text.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const READER_TIMEOUT: Duration = Duration::from_secs(60);

/// Reference to a source the extraction collaborator can turn into text.
#[derive(Debug, Clone)]
pub enum SourceRef {
    /// A web page to run through the readability endpoint.
    Url(String),
    /// Raw document bytes with a declared format kind (`pdf`, `docx`, ...).
    Document {
        /// Source file contents.
        bytes: Vec<u8>,
        /// Declared format of the bytes.
        kind: String,
    },
}

/// Errors raised while extracting text from a source.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Extraction ran but produced no usable text.
    #[error("no text could be extracted from the source")]
    NoText,
    /// The source format is not handled by this extractor.
    #[error("unsupported source type: {0}")]
    Unsupported(String),
    /// The extraction endpoint could not be reached or returned an error.
    #[error("extraction request failed: {0}")]
    Transport(String),
}

/// Interface implemented by extraction collaborators.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Derive plain text from the given source.
    async fn extract(&self, source: &SourceRef) -> Result<String, ExtractError>;
}

/// Extractor that fetches URL content through a hosted readability endpoint.
///
/// The endpoint follows the Jina Reader convention: `GET {base}/{url}` returns the page
/// as cleaned plain text, with an optional bearer token for authenticated tiers.
pub struct ReaderExtractor {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReaderExtractor {
    /// Construct an extractor targeting the given reader base URL.
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/reader")
            .timeout(READER_TIMEOUT)
            .build()
            .expect("Failed to construct reqwest::Client for extraction");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Build an extractor from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reader_url.clone(), config.reader_api_key.clone())
    }

    fn endpoint(&self, url: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), url)
    }
}

#[async_trait]
impl TextExtractor for ReaderExtractor {
    async fn extract(&self, source: &SourceRef) -> Result<String, ExtractError> {
        let url = match source {
            SourceRef::Url(url) => url,
            SourceRef::Document { kind, .. } => {
                return Err(ExtractError::Unsupported(kind.clone()));
            }
        };

        let mut request = self.http.get(self.endpoint(url));
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| {
            ExtractError::Transport(format!("failed to reach reader endpoint: {error}"))
        })?;

        if !response.status().is_success() {
            return Err(ExtractError::Transport(format!(
                "reader endpoint returned {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|error| ExtractError::Transport(format!("failed to read body: {error}")))?;

        if text.trim().is_empty() {
            return Err(ExtractError::NoText);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn reader_extractor_returns_page_text() {
        let server = MockServer::start_async().await;
        let extractor = ReaderExtractor::new(server.base_url(), None);

        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/https://example.org/article");
                then.status(200).body("Readable article text.");
            })
            .await;

        let text = extractor
            .extract(&SourceRef::Url("https://example.org/article".into()))
            .await
            .expect("extracted text");

        mock.assert();
        assert_eq!(text, "Readable article text.");
    }

    #[tokio::test]
    async fn reader_extractor_sends_bearer_token_when_configured() {
        let server = MockServer::start_async().await;
        let extractor = ReaderExtractor::new(server.base_url(), Some("secret".into()));

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/https://example.org/article")
                    .header("authorization", "Bearer secret");
                then.status(200).body("ok");
            })
            .await;

        extractor
            .extract(&SourceRef::Url("https://example.org/article".into()))
            .await
            .expect("extracted text");

        mock.assert();
    }

    #[tokio::test]
    async fn reader_extractor_flags_empty_body_as_no_text() {
        let server = MockServer::start_async().await;
        let extractor = ReaderExtractor::new(server.base_url(), None);

        server
            .mock_async(|when, then| {
                when.method(GET).path("/https://example.org/blank");
                then.status(200).body("   \n  ");
            })
            .await;

        let error = extractor
            .extract(&SourceRef::Url("https://example.org/blank".into()))
            .await
            .expect_err("empty body");

        assert!(matches!(error, ExtractError::NoText));
    }

    #[tokio::test]
    async fn reader_extractor_rejects_document_sources() {
        let server = MockServer::start_async().await;
        let extractor = ReaderExtractor::new(server.base_url(), None);

        let error = extractor
            .extract(&SourceRef::Document {
                bytes: vec![0x25, 0x50],
                kind: "pdf".into(),
            })
            .await
            .expect_err("unsupported");

        assert!(matches!(error, ExtractError::Unsupported(kind) if kind == "pdf"));
    }
}
