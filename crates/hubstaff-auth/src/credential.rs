//! Credential shapes accepted by the client

use std::sync::Arc;

use common::Secret;
use provider::{Provider, StaticBearerProvider};

use crate::cache::TokenProvider;
use crate::error::{Error, Result};
use crate::exchange_provider::TokenExchangeProvider;

/// A Hubstaff credential, fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Personal access token sent directly as the bearer token
    Static { access_token: Secret<String> },
    /// Personal access token exchanged as a refresh token, bound to one organization
    Refresh {
        personal_access_token: Secret<String>,
        organization_id: String,
    },
}

impl Credential {
    pub fn organization_id(&self) -> Option<&str> {
        match self {
            Credential::Static { .. } => None,
            Credential::Refresh {
                organization_id, ..
            } => Some(organization_id),
        }
    }

    /// Reject blank tokens and a blank organization ID.
    pub fn validate(&self) -> Result<()> {
        match self {
            Credential::Static { access_token } if access_token.is_blank() => Err(
                Error::InvalidCredentials("access token is empty".into()),
            ),
            Credential::Refresh {
                personal_access_token,
                ..
            } if personal_access_token.is_blank() => Err(Error::InvalidCredentials(
                "personal access token is empty".into(),
            )),
            Credential::Refresh {
                organization_id, ..
            } if organization_id.trim().is_empty() => Err(Error::InvalidCredentials(
                "organization ID is required for token exchange".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Build the provider for this credential.
    ///
    /// `tokens` is only used by the refresh variant.
    pub fn into_provider(self, tokens: TokenProvider) -> Result<Arc<dyn Provider>> {
        self.validate()?;
        let provider: Arc<dyn Provider> = match self {
            Credential::Static { access_token } => Arc::new(StaticBearerProvider::new(access_token)),
            Credential::Refresh {
                personal_access_token,
                organization_id,
            } => Arc::new(TokenExchangeProvider::new(
                tokens,
                personal_access_token,
                organization_id,
            )),
        };
        Ok(provider)
    }
}
