//! Backend API error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from a backend request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL or path could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// 401 from the backend
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403 from the backend
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404 from the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            other => ApiError::Status {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// 401 and 403 both end the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::Forbidden(_))
    }

    /// Message suitable for showing to the user
    ///
    /// Transport and decode details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            ApiError::Http(_) => "Could not reach the server".to_string(),
            ApiError::InvalidUrl(_) => "Client is misconfigured".to_string(),
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => {
                "Your session has expired, please sign in again".to_string()
            }
            ApiError::NotFound(_) => "Not found".to_string(),
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Status { status, .. } => format!("Request failed ({status})"),
            ApiError::Decode(_) => "The server sent an unexpected response".to_string(),
        }
    }
}

/// Result type for backend requests
pub type ApiResult<T> = Result<T, ApiError>;
