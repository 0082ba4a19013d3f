//! Hubstaff account service constants

use std::time::Duration;

/// Token endpoint for the refresh-token grant
pub const TOKEN_ENDPOINT: &str = "https://account.hubstaff.com/access_tokens";

/// A cached access token is only handed out while it outlives this margin.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
