use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for a single backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("http {status}: {detail}")]
    Status { status: u16, detail: String },
    /// A 2xx answer whose body does not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401 | 403, .. })
    }

    /// Short human text for toasts. Prefers the backend's `detail`.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server".to_string(),
            ApiError::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            ApiError::Status { status, .. } => format!("Server returned {status}"),
            ApiError::Decode(_) => "Unexpected response from the server".to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file is not valid json: {0}")]
    Format(#[from] serde_json::Error),
}
