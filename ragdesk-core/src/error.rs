use crate::api::ApiError;
use thiserror::Error;

/// What went wrong in a user-initiated operation.
///
/// The message is always the most specific one available and is meant to be
/// shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Empty or missing input, caught before any network call
    #[error("{0}")]
    Validation(String),

    /// Network failure or non-2xx status without a structured detail
    #[error("{0}")]
    Transport(String),

    /// Non-2xx status carrying the server's `detail` message
    #[error("{0}")]
    Server(String),
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => ClientError::Server(detail),
            ApiError::Status { status, detail: None } => {
                ClientError::Transport(format!("HTTP {status}"))
            }
            other => ClientError::Transport(other.to_string()),
        }
    }
}
