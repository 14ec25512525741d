use thiserror::Error;

/// Marker the platform puts into a start-broadcast rejection when the session
/// cookies no longer identify the streamer.
pub const CREDENTIAL_REJECTION_MARKER: &str = "主播身份校验失败";

/// Errors produced by [crate::api::LiveApi] operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but did not have the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The platform refused the session credentials.
    #[error("credentials rejected: {0}")]
    Credential(String),

    /// The request was refused locally before anything was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A lookup (room, category) came back empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform answered with a non-zero code.
    #[error("platform rejected the request (code {code}): {message}")]
    Rejected { code: i64, message: String },
}

impl ApiError {
    /// Builds the error for a non-zero platform code, recognising credential rejections.
    pub fn from_platform(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();

        if message.contains(CREDENTIAL_REJECTION_MARKER) {
            ApiError::Credential(message)
        } else {
            ApiError::Rejected { code, message }
        }
    }

    pub fn is_credential(&self) -> bool {
        matches!(self, ApiError::Credential(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Protocol(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Errors produced by [crate::store::Store].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is incomplete: {reason}")]
    Incomplete { path: String, reason: String },
}
