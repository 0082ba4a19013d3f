//! Authentication seam between the request dispatcher and credential handling
//!
//! The dispatcher never looks at credentials directly. It asks a `Provider` to
//! attach an `Authorization` header before each call and reports classified
//! failures back, so token-exchange providers can evict cached tokens on 401.
//! `StaticBearerProvider` covers the plain personal-access-token case.

pub mod static_bearer;

pub use static_bearer::StaticBearerProvider;

use std::future::Future;
use std::pin::Pin;

/// User-facing category of a failed Hubstaff API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 429: the 1,000 requests/hour budget is spent
    RateLimited,
    /// 401: token invalid or expired
    AuthenticationFailed,
    /// 403: plan or role does not allow this resource
    Forbidden,
    /// 404
    NotFound,
    /// 422: upstream rejected the submitted fields
    ValidationFailed,
    /// Anything else, including transport failures
    Generic,
}

impl ErrorCategory {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ErrorCategory::RateLimited,
            401 => ErrorCategory::AuthenticationFailed,
            403 => ErrorCategory::Forbidden,
            404 => ErrorCategory::NotFound,
            422 => ErrorCategory::ValidationFailed,
            _ => ErrorCategory::Generic,
        }
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::AuthenticationFailed => "authentication_failed",
            ErrorCategory::Forbidden => "forbidden",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::ValidationFailed => "validation_failed",
            ErrorCategory::Generic => "generic",
        }
    }
}

/// Errors raised while producing credentials for a request.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Credential strategy used by the request dispatcher.
///
/// Uses `Pin<Box<dyn Future>>` return types so it stays usable as `Arc<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Identifier for logging (e.g. "static", "token_exchange")
    fn id(&self) -> &str;

    /// Organization ID carried by the credential itself, if any.
    fn organization_id(&self) -> Option<&str> {
        None
    }

    /// Insert the `Authorization` header for the next request.
    fn authorize<'a>(
        &'a self,
        headers: &'a mut reqwest::header::HeaderMap,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Feed a classified API failure back to the provider.
    fn report_error(
        &self,
        category: ErrorCategory,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Build a `Bearer` header value, marked sensitive so it is hidden from `Debug`.
pub fn bearer_header(token: &str) -> Result<reqwest::header::HeaderValue> {
    let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ProviderError::InvalidCredential(format!("token is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_documented_codes() {
        assert_eq!(ErrorCategory::from_status(429), ErrorCategory::RateLimited);
        assert_eq!(
            ErrorCategory::from_status(401),
            ErrorCategory::AuthenticationFailed
        );
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::Forbidden);
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::NotFound);
        assert_eq!(
            ErrorCategory::from_status(422),
            ErrorCategory::ValidationFailed
        );
    }

    #[test]
    fn unknown_statuses_are_generic() {
        for status in [400, 408, 500, 502, 503, 418] {
            assert_eq!(
                ErrorCategory::from_status(status),
                ErrorCategory::Generic,
                "status {status}"
            );
        }
    }

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(ErrorCategory::RateLimited.label(), "rate_limited");
        assert_eq!(
            ErrorCategory::AuthenticationFailed.label(),
            "authentication_failed"
        );
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let value = bearer_header("abc").unwrap();
        assert_eq!(value, "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_header_rejects_control_characters() {
        let err = bearer_header("bad\ntoken").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCredential(_)));
    }
}
