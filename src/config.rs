use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default base URL for the local Ollama runtime.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
/// Default model identifier passed to the summarization backend.
pub const DEFAULT_SUMMARY_MODEL: &str = "llama3.2:3b";
/// Default character cap applied to normalized input text.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 24_000;
/// Default character threshold below which a document is summarized in one pass.
pub const DEFAULT_SHORT_TEXT_THRESHOLD: usize = 3_000;
/// Default token budget per chunk.
pub const DEFAULT_CHUNK_TOKENS: usize = 1_000;
/// Default token overlap between adjacent chunks.
pub const DEFAULT_CHUNK_OVERLAP_TOKENS: usize = 75;
/// Approximate characters per token used to derive character budgets.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;
/// Default number of concurrent chunk-summarization workers.
pub const DEFAULT_SUMMARY_WORKERS: usize = 2;
/// Default per-chunk generation timeout in seconds.
pub const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 120;
/// Default merge/single-pass generation timeout in seconds.
pub const DEFAULT_MERGE_TIMEOUT_SECS: u64 = 180;
/// Default readability-extraction endpoint for URL sources.
pub const DEFAULT_READER_URL: &str = "https://r.jina.ai";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the DocDigest server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama runtime serving the summarization model.
    pub ollama_url: String,
    /// Model identifier used for all summarization calls.
    pub summary_model: String,
    /// Maximum number of characters retained from normalized input text.
    pub max_input_chars: usize,
    /// Character count below which a document takes the single-pass path.
    pub short_text_threshold: usize,
    /// Token budget per chunk during splitting.
    pub chunk_tokens: usize,
    /// Token overlap carried between adjacent chunks.
    pub chunk_overlap_tokens: usize,
    /// Approximate characters per token for budget conversion.
    pub chars_per_token: usize,
    /// Concurrency cap for the chunk-summarization worker pool.
    pub summary_workers: usize,
    /// Per-chunk generation timeout in seconds.
    pub chunk_timeout_secs: u64,
    /// Merge and single-pass generation timeout in seconds.
    pub merge_timeout_secs: u64,
    /// Base URL of the readability extraction endpoint for URL sources.
    pub reader_url: String,
    /// Optional bearer token for the readability endpoint.
    pub reader_api_key: Option<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            summary_model: load_env_optional("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            max_input_chars: load_parsed("SUMMARY_MAX_INPUT_CHARS")?
                .unwrap_or(DEFAULT_MAX_INPUT_CHARS),
            short_text_threshold: load_parsed("SUMMARY_SHORT_TEXT_THRESHOLD")?
                .unwrap_or(DEFAULT_SHORT_TEXT_THRESHOLD),
            chunk_tokens: load_parsed("SUMMARY_CHUNK_TOKENS")?.unwrap_or(DEFAULT_CHUNK_TOKENS),
            chunk_overlap_tokens: load_parsed("SUMMARY_CHUNK_OVERLAP_TOKENS")?
                .unwrap_or(DEFAULT_CHUNK_OVERLAP_TOKENS),
            chars_per_token: load_parsed("SUMMARY_CHARS_PER_TOKEN")?
                .unwrap_or(DEFAULT_CHARS_PER_TOKEN),
            summary_workers: load_parsed("SUMMARY_WORKERS")?.unwrap_or(DEFAULT_SUMMARY_WORKERS),
            chunk_timeout_secs: load_parsed("SUMMARY_CHUNK_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_CHUNK_TIMEOUT_SECS),
            merge_timeout_secs: load_parsed("SUMMARY_MERGE_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_MERGE_TIMEOUT_SECS),
            reader_url: load_env_optional("READER_URL")
                .unwrap_or_else(|| DEFAULT_READER_URL.to_string()),
            reader_api_key: load_env_optional("READER_API_KEY"),
            server_port: load_parsed("SERVER_PORT")?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        ollama_url = %config.ollama_url,
        model = %config.summary_model,
        short_text_threshold = config.short_text_threshold,
        chunk_tokens = config.chunk_tokens,
        workers = config.summary_workers,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
