//! Token-exchange provider: the personal access token is a refresh token.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use provider::{ErrorCategory, Provider, ProviderError, bearer_header};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use tracing::info;

use crate::cache::TokenProvider;
use crate::error::Error;

/// Exchanges the configured personal access token for short-lived access
/// tokens and carries the organization ID bound to the credential.
pub struct TokenExchangeProvider {
    tokens: TokenProvider,
    personal_access_token: Secret<String>,
    organization_id: String,
}

impl TokenExchangeProvider {
    pub fn new(
        tokens: TokenProvider,
        personal_access_token: Secret<String>,
        organization_id: String,
    ) -> Self {
        Self {
            tokens,
            personal_access_token,
            organization_id,
        }
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }
}

impl Provider for TokenExchangeProvider {
    fn id(&self) -> &str {
        "token_exchange"
    }

    fn organization_id(&self) -> Option<&str> {
        Some(&self.organization_id)
    }

    fn authorize<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let access = self
                .tokens
                .access_token(self.personal_access_token.expose())
                .await
                .map_err(|e| match e {
                    Error::InvalidCredentials(msg) => ProviderError::InvalidCredential(msg),
                    other => ProviderError::TokenExchange(other.to_string()),
                })?;
            headers.insert(AUTHORIZATION, bearer_header(&access)?);
            Ok(())
        })
    }

    fn report_error(
        &self,
        category: ErrorCategory,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if category == ErrorCategory::AuthenticationFailed
                && self
                    .tokens
                    .cache()
                    .evict(self.personal_access_token.expose())
                    .await
                    .is_some()
            {
                info!("API rejected access token, cache entry evicted");
            }
        })
    }
}
