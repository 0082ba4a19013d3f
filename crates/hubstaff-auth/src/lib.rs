//! Hubstaff credential handling
//!
//! Turns a configured credential into an `Authorization` header. A static
//! personal access token is sent as-is; in exchange mode the token is treated as
//! an OAuth refresh token and traded for short-lived access tokens at the
//! Hubstaff account service.
//!
//! Exchange flow:
//! 1. `TokenExchangeProvider::authorize` asks `TokenProvider::access_token`
//! 2. `TokenCache` answers if the cached token outlives the 5 minute margin
//! 3. Otherwise `token::refresh_access_token` posts to the token endpoint
//! 4. The (possibly rotated) refresh token and new expiry replace the entry
//! 5. A 401 from the API evicts the entry so the next call re-exchanges

pub mod cache;
pub mod constants;
pub mod credential;
pub mod error;
pub mod exchange_provider;
pub mod token;

pub use cache::{CachedToken, TokenCache, TokenProvider};
pub use constants::*;
pub use credential::Credential;
pub use error::{Error, Result};
pub use exchange_provider::TokenExchangeProvider;
pub use token::{TokenResponse, refresh_access_token};
