//! Request dispatcher
//!
//! Authorizes, sends and classifies one API call. Nothing is retried here: a
//! 401 only tells the provider to drop its cached token so the next call
//! exchanges again.

use std::sync::Arc;
use std::time::Instant;

use provider::{ErrorCategory, Provider};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::adapter::{AdapterContext, EndpointAdapter};
use crate::classify::{classify_response, transport_error};
use crate::error::{ApiError, Error, Result};
use crate::request::ApiRequest;
use crate::resource::Invocation;

/// Hubstaff API v2 base URL
pub const API_BASE_URL: &str = "https://api.hubstaff.com/v2";

/// Dispatches Hubstaff API calls for one credential.
///
/// Cheap to clone; the HTTP client, provider and adapter are shared.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    provider: Arc<dyn Provider>,
    adapter: Arc<dyn EndpointAdapter>,
    base_url: String,
}

impl Client {
    pub fn new(
        http: reqwest::Client,
        provider: Arc<dyn Provider>,
        adapter: Arc<dyn EndpointAdapter>,
    ) -> Self {
        Self {
            http,
            provider,
            adapter,
            base_url: API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Plan and send one invocation.
    ///
    /// Returns the decoded body, or the adapter's acknowledgement for calls
    /// whose response carries nothing useful (deletes).
    #[instrument(skip_all, fields(resource = %invocation.resource, operation = %invocation.operation))]
    pub async fn execute(&self, invocation: &Invocation) -> Result<Value> {
        let ctx = AdapterContext {
            organization_id: self.provider.organization_id(),
        };
        let plan = self.adapter.plan(invocation, &ctx)?;
        let response = self.request(plan.request).await?;
        Ok(plan.ack.unwrap_or(response))
    }

    /// Send one request and decode the JSON response.
    #[instrument(skip_all, fields(method = %request.method, endpoint = %request.endpoint))]
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        if !request.endpoint.starts_with('/') {
            return Err(Error::Validation(format!(
                "endpoint must start with '/': {}",
                request.endpoint
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.provider
            .authorize(&mut headers)
            .await
            .map_err(|e| Error::AuthExchange(e.to_string()))?;

        let url = format!("{}{}", self.base_url, request.endpoint);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query.to_pairs());
        }
        if !request.body.is_empty() {
            builder = builder.json(&request.body);
        }

        let method = request.method.as_str().to_string();
        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                record(&method, "error", start);
                warn!(error = %e, "request to Hubstaff failed");
                return Err(transport_error(&e).into());
            }
        };

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            record(&method, "error", start);
            Error::from(transport_error(&e))
        })?;
        record(&method, status.as_str(), start);

        if status.is_success() {
            debug!(status = status.as_u16(), "request succeeded");
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| {
                Error::from(ApiError {
                    category: ErrorCategory::Generic,
                    status: Some(status.as_u16()),
                    message: "Hubstaff API returned a response that is not JSON".into(),
                    description: e.to_string(),
                    body: text.clone(),
                })
            });
        }

        let error = classify_response(status.as_u16(), &text);
        warn!(
            status = status.as_u16(),
            category = error.category.label(),
            provider = self.provider.id(),
            "Hubstaff API request failed"
        );
        self.provider.report_error(error.category).await;
        Err(error.into())
    }
}

fn record(method: &str, status: &str, start: Instant) {
    metrics::counter!("hubstaff_requests_total", "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!("hubstaff_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
