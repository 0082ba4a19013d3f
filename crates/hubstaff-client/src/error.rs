//! Error types for dispatching Hubstaff API calls

use provider::ErrorCategory;

/// A failed API call, classified for display.
///
/// `message` is the headline, `description` the hint shown under it. `body` is
/// the raw upstream response (empty for transport failures).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub status: Option<u16>,
    pub message: String,
    pub description: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected locally; no network call was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The provider could not produce credentials (token exchange failed).
    #[error("authentication setup failed: {0}")]
    AuthExchange(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// Category for API failures, `None` for local errors.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Api(api) => Some(api.category),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Error::Api(api) => Some(&api.description),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
