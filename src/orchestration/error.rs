// Error types for the content pipeline

use super::types::ContentType;

/// Errors from the remote predictions API
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Prediction failed with status: {status} ({message})")]
    PredictionFailed { status: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Errors while fetching or writing artifacts
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Download failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Download failed with HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised inside a single generation; always converted into a failed result
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Model '{key}' not found for content type {content_type}")]
    Resolution { content_type: ContentType, key: String },

    #[error("Invalid model reference '{0}': expected owner/name[:version]")]
    InvalidModelRef(String),

    #[error("Invalid dimensions '{0}': expected <width>x<height>")]
    InvalidDimensions(String),

    #[error("Invalid value for '{key}': expected {expected}")]
    InvalidParam { key: String, expected: &'static str },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),
}

/// Errors surfaced to callers of the orchestrator itself
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Missing API token: set REPLICATE_API_TOKEN or api_token in the config file")]
    MissingCredential,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown content type: {0}")]
pub struct UnknownContentType(pub String);
