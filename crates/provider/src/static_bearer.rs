//! Static bearer provider: the personal access token is sent as-is.

use crate::{ErrorCategory, Provider, bearer_header};
use common::Secret;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Sends a fixed token on every request. No exchange, no cache.
pub struct StaticBearerProvider {
    token: Secret<String>,
}

impl StaticBearerProvider {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

impl Provider for StaticBearerProvider {
    fn id(&self) -> &str {
        "static"
    }

    fn authorize<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = crate::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            headers.insert(AUTHORIZATION, bearer_header(self.token.expose())?);
            Ok(())
        })
    }

    fn report_error(
        &self,
        category: ErrorCategory,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        // Nothing cached, so a 401 has no state to clear.
        Box::pin(async move {
            debug!(category = category.label(), "static provider ignores error report");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[tokio::test]
    async fn inserts_bearer_token() {
        let provider = StaticBearerProvider::new(Secret::from("pat_123"));
        let mut headers = HeaderMap::new();
        provider.authorize(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer pat_123");
    }

    #[tokio::test]
    async fn replaces_existing_authorization() {
        let provider = StaticBearerProvider::new(Secret::from("pat_new"));
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
        provider.authorize(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer pat_new");
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[tokio::test]
    async fn report_error_is_noop() {
        let provider = StaticBearerProvider::new(Secret::from("pat"));
        provider
            .report_error(ErrorCategory::AuthenticationFailed)
            .await;
        let mut headers = HeaderMap::new();
        provider.authorize(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer pat");
    }

    #[test]
    fn id_and_organization() {
        let provider = StaticBearerProvider::new(Secret::from("pat"));
        assert_eq!(provider.id(), "static");
        assert!(provider.organization_id().is_none());
    }
}
