//! Error types for the kdrivefs library.

use thiserror::Error;

use crate::api::ApiErrorCode;

/// Main error type for kdrivefs operations.
#[derive(Error, Debug)]
pub enum KdriveError {
    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Local I/O error while reading a payload or writing into a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// kDrive API returned an error envelope.
    #[error("API error: {code} - {description}")]
    ApiError { code: String, description: String },

    /// Server kept answering 429/5xx after all retries.
    #[error("Server busy, try again later")]
    ServerBusy,

    /// The request did not complete within the configured timeout.
    #[error("HTTP request timed out")]
    Timeout,

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// The mount root URL does not carry a drive id and a file id.
    #[error("Invalid root URL: {0}")]
    InvalidRootUrl(String),

    /// Mount configuration is missing a required field.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The path cannot be used for the requested operation.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Nothing exists at the given path.
    #[error("Path doesn't exist: {0}")]
    NotFound(String),

    /// The path resolves to a directory where a file is required.
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl KdriveError {
    /// Typed view of the kDrive error code, if this is an API error.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            KdriveError::ApiError { code, .. } => Some(ApiErrorCode::from(code.as_str())),
            _ => None,
        }
    }

    /// Whether the remote store reported the addressed node as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            KdriveError::NotFound(_) | KdriveError::HttpError(404) => true,
            KdriveError::ApiError { .. } => self.api_code() == Some(ApiErrorCode::ObjectNotFound),
            _ => false,
        }
    }
}

/// Result type alias for kdrivefs operations.
pub type Result<T> = std::result::Result<T, KdriveError>;
