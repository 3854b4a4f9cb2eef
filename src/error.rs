use thiserror::Error;

/// Errors raised by the tree cache, the panels and the remote directory service.
///
/// All of them are recoverable: an operation that fails leaves the state it owns
/// untouched (apart from the documented navigation exceptions) and the caller
/// decides whether to surface the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FmError {
    /// A path referenced by an operation is not present in the current state.
    #[error("Directory not found: {path}")]
    NotFound { path: String },

    /// The remote side answered, but did not report success.
    #[error("{message}")]
    RemoteFailure { message: String },

    /// A response arrived for a request that has since been superseded.
    #[error("Request superseded (generation {generation})")]
    Cancelled { generation: u64 },

    /// Transport level failure (connection, timeout, non-2xx status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Settings file could not be read, parsed or written.
    #[error("Settings error: {0}")]
    Config(String),
}

impl FmError {
    pub fn not_found(path: impl Into<String>) -> Self {
        FmError::NotFound { path: path.into() }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        FmError::RemoteFailure {
            message: message.into(),
        }
    }

    /// Stale responses are dropped silently; everything else is user facing.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, FmError::Cancelled { .. })
    }
}

impl From<reqwest::Error> for FmError {
    fn from(e: reqwest::Error) -> Self {
        FmError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for FmError {
    fn from(e: serde_json::Error) -> Self {
        FmError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FmError>;
