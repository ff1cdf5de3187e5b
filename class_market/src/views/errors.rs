//! View error types.

use crate::{
    auth::SessionError,
    models::ClassStatus,
    net::ApiError,
    payment::PaymentError,
    store::StoreError,
    upload::UploadError,
    validation::ValidationError,
};
use thiserror::Error;

/// Errors from view actions
#[derive(Debug, Error)]
pub enum ViewError {
    /// Action needs a signed-in user
    #[error("Please sign in first")]
    NotSignedIn,

    /// Signed in, but the role may not do this
    #[error("{0}")]
    NotPermitted(&'static str),

    /// No seats left in the class
    #[error("This class is sold out")]
    SoldOut,

    /// Student already owns the class
    #[error("You are already enrolled in this class")]
    AlreadyEnrolled,

    /// Class is already selected
    #[error("This class is already in your cart")]
    AlreadyInCart,

    /// Moderation attempted on a class that is not pending
    #[error("Class is {from}, it cannot become {to}")]
    InvalidTransition { from: ClassStatus, to: ClassStatus },

    /// User declined a confirmation prompt
    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ViewError {
    /// Message suitable for showing to the user
    pub fn client_message(&self) -> String {
        match self {
            ViewError::Upload(e) => e.client_message(),
            ViewError::Session(e) => e.client_message(),
            ViewError::Api(e) => e.client_message(),
            ViewError::Store(_) => "Could not save locally".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the session was torn down because of this error.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ViewError::Api(e) if e.is_auth_failure())
    }
}

/// Result type for view actions
pub type ViewResult<T> = Result<T, ViewError>;

/// Checkout errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to pay for
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please sign in first")]
    NotSignedIn,

    /// Gateway did not report success
    #[error("Payment was not completed (status: {0})")]
    NotCompleted(String),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

impl CheckoutError {
    pub fn client_message(&self) -> String {
        match self {
            CheckoutError::Payment(e) => e.client_message(),
            CheckoutError::Api(e) => e.client_message(),
            other => other.to_string(),
        }
    }
}

/// Result type for checkout
pub type CheckoutResult<T> = Result<T, CheckoutError>;
