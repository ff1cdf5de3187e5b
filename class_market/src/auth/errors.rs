//! Authentication error types.

use crate::{net::ApiError, store::StoreError, validation::ValidationError};
use thiserror::Error;

/// Identity provider failure, carrying the provider's error code
/// (`auth/wrong-password`, `auth/email-already-in-use`, ...).
///
/// The code is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}")]
pub struct ProviderError {
    pub code: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn network() -> Self {
        Self::new("auth/network-request-failed")
    }

    /// Map an Identity Toolkit REST error message (`EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be ...`) to a provider code.
    pub fn from_rest_message(message: &str) -> Self {
        let key = message.split(':').next().unwrap_or_default().trim();
        let code = match key {
            "EMAIL_EXISTS" => "auth/email-already-in-use",
            "EMAIL_NOT_FOUND" => "auth/user-not-found",
            "INVALID_PASSWORD" => "auth/wrong-password",
            "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
            "INVALID_EMAIL" => "auth/invalid-email",
            "WEAK_PASSWORD" => "auth/weak-password",
            "USER_DISABLED" => "auth/user-disabled",
            "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
            "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed",
            "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                "auth/user-token-expired"
            }
            "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => "auth/invalid-user-token",
            "INVALID_IDP_RESPONSE" => "auth/invalid-credential",
            "" => "auth/internal-error",
            other => return Self::new(format!("auth/{}", other.to_lowercase().replace('_', "-"))),
        };
        Self::new(code)
    }
}

/// Result type for identity provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Identity provider rejected the operation
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Form input rejected before reaching the provider
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Operation needs a signed-in identity
    #[error("Not signed in")]
    NotSignedIn,

    /// Backend call made on behalf of the session failed
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Local persistence failed
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Provider codes and validation messages are shown verbatim; backend
    /// and storage errors are sanitized.
    pub fn client_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.client_message(),
            SessionError::Store(_) => "Could not save the session locally".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_message_mapping() {
        assert_eq!(
            ProviderError::from_rest_message("EMAIL_EXISTS").code,
            "auth/email-already-in-use"
        );
        assert_eq!(
            ProviderError::from_rest_message("WEAK_PASSWORD : Password should be at least 6 characters").code,
            "auth/weak-password"
        );
        assert_eq!(
            ProviderError::from_rest_message("INVALID_LOGIN_CREDENTIALS").code,
            "auth/invalid-credential"
        );
    }

    #[test]
    fn test_unknown_rest_message_is_kebab_cased() {
        assert_eq!(
            ProviderError::from_rest_message("MISSING_REQ_TYPE").code,
            "auth/missing-req-type"
        );
        assert_eq!(ProviderError::from_rest_message("").code, "auth/internal-error");
    }

    #[test]
    fn test_provider_code_shown_verbatim() {
        let err = SessionError::from(ProviderError::new("auth/wrong-password"));
        assert_eq!(err.client_message(), "auth/wrong-password");
    }
}
