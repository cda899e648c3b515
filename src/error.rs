//! Error types for the contrarx service.

use thiserror::Error;

/// Main error type for contrarx operations.
#[derive(Error, Debug)]
pub enum ContrarxError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Drug source error: {0}")]
    Source(#[from] SourceError),

    #[error("Reasoning error: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContrarxError {
    /// Build a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        ContrarxError::Validation(msg.into())
    }

    /// Build a not-found error naming the missing item.
    pub fn not_found(what: impl Into<String>) -> Self {
        ContrarxError::NotFound(what.into())
    }
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Persistent-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the external drug source. All variants are transient:
/// they are surfaced per-call and never persisted as negative cache
/// entries, so a later retry can succeed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

/// Errors from the external reasoning service. Transport-level failures
/// only; malformed response *content* is handled by degrading the verdict,
/// not by raising one of these.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider response contained no completion content")]
    MissingContent,

    #[error("API key not provided and {0} env var not set")]
    MissingApiKey(&'static str),
}

/// Result type alias for contrarx operations.
pub type Result<T> = std::result::Result<T, ContrarxError>;
