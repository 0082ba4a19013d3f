//! Refresh-token grant against the Hubstaff account service
//!
//! The personal access token acts as the refresh token. The account service
//! may rotate it: when the response carries a new `refresh_token` the caller
//! must use that one for the next exchange.

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Response from the token endpoint.
///
/// `expires_in` is a delta in seconds; `None` means the caller's fallback TTL
/// applies. `refresh_token` is only present when the service rotated it.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchange a refresh token for an access token.
///
/// 401/403 from the endpoint map to `InvalidCredentials` (token revoked or
/// wrong); any other failure, including a success body without an
/// `access_token`, is `TokenExchange`.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_endpoint: &str,
    refresh: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(token_endpoint)
        .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh)])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "personal access token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;

    if token.access_token.is_empty() {
        return Err(Error::TokenExchange(
            "token endpoint response did not include an access_token".into(),
        ));
    }

    debug!(
        rotated = token.refresh_token.is_some(),
        expires_in = ?token.expires_in,
        "token exchange succeeded"
    );
    Ok(token)
}
