//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The Hubstaff token is loaded from the HUBSTAFF_TOKEN env var or
//! token_file, never stored in the TOML directly to avoid leaking secrets.

use common::Secret;
use hubstaff_auth::{Credential, DEFAULT_TOKEN_TTL, TOKEN_ENDPOINT};
use hubstaff_client::{API_BASE_URL, AdapterKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credential: CredentialConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Hubstaff endpoints and client behaviour
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default)]
    pub adapter: AdapterKind,
    /// Per-request timeout; the HTTP client default when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Lifetime assumed when the token endpoint omits `expires_in`
    #[serde(default = "default_token_ttl")]
    pub default_token_ttl_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_endpoint: default_token_endpoint(),
            adapter: AdapterKind::default(),
            timeout_secs: None,
            default_token_ttl_secs: default_token_ttl(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Token sent as the bearer token
    #[default]
    Static,
    /// Token exchanged as a refresh token
    Refresh,
}

/// Credential settings
#[derive(Debug, Default, Deserialize)]
pub struct CredentialConfig {
    #[serde(default)]
    pub mode: CredentialMode,
    #[serde(skip)]
    pub token: Option<Secret<String>>,
    /// Path to a file containing the token (alternative to HUBSTAFF_TOKEN env var)
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Batch execution settings
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionConfig {
    /// Record failed items and keep going instead of aborting the run
    #[serde(default)]
    pub continue_on_fail: bool,
}

fn default_base_url() -> String {
    API_BASE_URL.to_string()
}

fn default_token_endpoint() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL.as_secs()
}

fn require_http_url(name: &str, url: &str) -> common::Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(common::Error::Config(format!(
            "{name} must start with http:// or https://, got: {url}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Token resolution order:
    /// 1. HUBSTAFF_TOKEN env var
    /// 2. token_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        require_http_url("base_url", &config.api.base_url)?;
        require_http_url("token_endpoint", &config.api.token_endpoint)?;

        if config.api.timeout_secs == Some(0) {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.api.default_token_ttl_secs == 0 {
            return Err(common::Error::Config(
                "default_token_ttl_secs must be greater than 0".into(),
            ));
        }

        if config.credential.mode == CredentialMode::Refresh
            && config
                .credential
                .organization_id
                .as_deref()
                .is_none_or(|org| org.trim().is_empty())
        {
            return Err(common::Error::Config(
                "organization_id is required when credential mode is \"refresh\"".into(),
            ));
        }

        // Static tokens carry no organization, which the scoped adapter needs.
        if config.api.adapter == AdapterKind::OrganizationScoped
            && config.credential.mode == CredentialMode::Static
        {
            return Err(common::Error::Config(
                "api.adapter \"organization_scoped\" requires credential.mode \"refresh\"".into(),
            ));
        }

        // Resolve token: env var takes precedence over file
        if let Ok(token) = std::env::var("HUBSTAFF_TOKEN") {
            config.credential.token = Some(Secret::new(token));
        } else if let Some(ref token_file) = config.credential.token_file {
            let token = std::fs::read_to_string(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            let token = token.trim().to_owned();
            if !token.is_empty() {
                config.credential.token = Some(Secret::new(token));
            }
        }

        if config.credential.token.as_ref().is_none_or(|t| t.is_blank()) {
            return Err(common::Error::MissingCredential(
                "set HUBSTAFF_TOKEN or credential.token_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("hubstaff.toml")
    }

    /// Build the credential described by the `[credential]` section.
    pub fn credential(&self) -> common::Result<Credential> {
        let token = self
            .credential
            .token
            .clone()
            .ok_or_else(|| common::Error::MissingCredential("HUBSTAFF_TOKEN".into()))?;
        Ok(match self.credential.mode {
            CredentialMode::Static => Credential::Static {
                access_token: token,
            },
            CredentialMode::Refresh => Credential::Refresh {
                personal_access_token: token,
                organization_id: self
                    .credential
                    .organization_id
                    .clone()
                    .unwrap_or_default(),
            },
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    pub fn default_token_ttl(&self) -> Duration {
        Duration::from_secs(self.api.default_token_ttl_secs)
    }
}
