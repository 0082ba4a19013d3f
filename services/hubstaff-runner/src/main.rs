//! Hubstaff batch runner
//!
//! Single-binary CLI that:
//! 1. Loads the TOML config and the Hubstaff credential
//! 2. Reads a JSON batch of `(resource, operation, params)` invocations
//! 3. Runs each one against the Hubstaff v2 API
//! 4. Prints the results as a JSON array on stdout

mod batch;
mod config;
mod error;

use anyhow::{Context, Result};
use hubstaff_auth::{TokenCache, TokenProvider};
use hubstaff_client::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Value following `flag` on the command line.
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Build the API client described by `config`.
///
/// The token cache lives as long as the returned client.
fn build_client(config: &Config) -> Result<Client> {
    let mut http = reqwest::Client::builder();
    if let Some(timeout) = config.timeout() {
        http = http.timeout(timeout);
    }
    let http = http.build().context("failed to build HTTP client")?;

    let tokens = TokenProvider::new(
        http.clone(),
        config.api.token_endpoint.clone(),
        Arc::new(TokenCache::new()),
    )
    .with_default_ttl(config.default_token_ttl());

    let provider = config
        .credential()?
        .into_provider(tokens)
        .context("invalid Hubstaff credential")?;

    Ok(Client::new(http, provider, config.api.adapter.build())
        .with_base_url(config.api.base_url.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support.
    // stdout carries the results, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    // CLI: simple --config / --input flag parsing
    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::resolve_path(arg_value(&args, "--config"));
    let input_path = arg_value(&args, "--input").map(PathBuf::from);

    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let client = build_client(&config)?;
    info!(
        base_url = %config.api.base_url,
        adapter = client.adapter_name(),
        mode = ?config.credential.mode,
        continue_on_fail = config.execution.continue_on_fail,
        "configuration loaded"
    );

    let invocations = batch::read_invocations(input_path.as_deref())
        .await
        .context("failed to read invocations")?;

    let run_id = format!("run_{}", uuid::Uuid::new_v4().as_simple());
    let results = batch::run(&client, &invocations, config.execution.continue_on_fail)
        .instrument(info_span!("batch", run_id = %run_id, items = invocations.len()))
        .await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CredentialConfig, CredentialMode};
    use common::Secret;
    use hubstaff_client::{AdapterKind, Invocation, Operation, Params, Resource};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api: &MockServer, auth: &MockServer, mode: CredentialMode) -> Config {
        let mut config = Config {
            credential: CredentialConfig {
                mode,
                token: Some(Secret::from("pat_test")),
                organization_id: Some("42".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        config.api.base_url = api.uri();
        config.api.token_endpoint = format!("{}/access_tokens", auth.uri());
        config.api.adapter = AdapterKind::OrganizationScoped;
        config
    }

    #[test]
    fn arg_value_reads_flag() {
        let args: Vec<String> = ["runner", "--config", "a.toml", "--input", "in.json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(arg_value(&args, "--config"), Some("a.toml"));
        assert_eq!(arg_value(&args, "--input"), Some("in.json"));
        assert_eq!(arg_value(&args, "--verbose"), None);
    }

    #[test]
    fn arg_value_without_value_is_none() {
        let args: Vec<String> = vec!["runner".into(), "--input".into()];
        assert_eq!(arg_value(&args, "--input"), None);
    }

    #[tokio::test]
    async fn static_credential_sends_token_directly() {
        let api = MockServer::start().await;
        let auth = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/42"))
            .and(header("authorization", "Bearer pat_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organization": {}})))
            .expect(1)
            .mount(&api)
            .await;

        // Static credentials carry no organization, so the scoped adapter
        // serves only user lookups and the organization list.
        let client = build_client(&config(&api, &auth, CredentialMode::Static)).unwrap();
        let err = client
            .execute(&Invocation::new(
                Resource::Organization,
                Operation::Get,
                Params::new(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, hubstaff_client::Error::Validation(_)));

        let mut cfg = config(&api, &auth, CredentialMode::Static);
        cfg.api.adapter = AdapterKind::Legacy;
        let client = build_client(&cfg).unwrap();
        client
            .execute(&Invocation::new(
                Resource::Organization,
                Operation::Get,
                Params::new().with("organizationId", 42),
            ))
            .await
            .unwrap();
        assert!(auth.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_credential_exchanges_token() {
        let api = MockServer::start().await;
        let auth = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/access_tokens"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "at_exchanged", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&auth)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/42/members"))
            .and(header("authorization", "Bearer at_exchanged"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": []})))
            .expect(1)
            .mount(&api)
            .await;

        let client = build_client(&config(&api, &auth, CredentialMode::Refresh)).unwrap();
        let value = client
            .execute(&Invocation::new(
                Resource::Member,
                Operation::GetAll,
                Params::new(),
            ))
            .await
            .unwrap();
        assert_eq!(value, json!({"members": []}));
    }

    #[tokio::test]
    async fn refresh_credential_with_blank_organization_fails_setup() {
        let api = MockServer::start().await;
        let auth = MockServer::start().await;
        let mut cfg = config(&api, &auth, CredentialMode::Refresh);
        cfg.credential.organization_id = Some(" ".into());

        let err = build_client(&cfg).err().unwrap();
        assert!(format!("{err:#}").contains("organization ID"), "got: {err:#}");
    }
}
