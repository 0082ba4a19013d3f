//! Endpoint adapters: invocation -> REST call
//!
//! The Hubstaff API exposes the same resources through two incompatible
//! mappings. Each mapping is an `EndpointAdapter`; configuration picks one via
//! `AdapterKind` and the client never branches on it.

mod legacy;
mod org_scoped;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::format::format_date;
use crate::request::{ApiRequest, Body, Query};
use crate::resource::{Invocation, Params};

pub use legacy::LegacyAdapter;
pub use org_scoped::OrganizationScopedAdapter;

/// Per-client facts an adapter may need besides the invocation itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterContext<'a> {
    /// Organization bound to the credential, if any
    pub organization_id: Option<&'a str>,
}

/// What to send, and what to return instead of the response body.
#[derive(Debug, Clone)]
pub struct Plan {
    pub request: ApiRequest,
    /// Replaces the (empty) API response, used by deletes
    pub ack: Option<Value>,
}

impl Plan {
    pub fn call(request: ApiRequest) -> Self {
        Self { request, ack: None }
    }

    pub fn acknowledged(request: ApiRequest, ack: Value) -> Self {
        Self {
            request,
            ack: Some(ack),
        }
    }
}

pub trait EndpointAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build the request for one invocation. Never touches the network.
    fn plan(&self, invocation: &Invocation, ctx: &AdapterContext<'_>) -> Result<Plan>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    #[default]
    Legacy,
    OrganizationScoped,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Legacy => "legacy",
            AdapterKind::OrganizationScoped => "organization_scoped",
        }
    }

    pub fn build(self) -> Arc<dyn EndpointAdapter> {
        match self {
            AdapterKind::Legacy => Arc::new(LegacyAdapter),
            AdapterKind::OrganizationScoped => Arc::new(OrganizationScopedAdapter),
        }
    }
}

fn unsupported(invocation: &Invocation) -> Error {
    Error::Validation(format!(
        "operation '{}' is not supported for resource '{}'",
        invocation.operation, invocation.resource
    ))
}

/// `status` filter; "all" means no filter.
fn status_filter(query: &mut Query, fields: &Params) {
    if let Some(status) = fields.text("status").filter(|s| s != "all") {
        query.insert("status", status);
    }
}

fn page(query: &mut Query, fields: &Params) {
    if let Some(page) = fields.number("page") {
        query.insert("page", page);
    }
}

/// `user_ids`, `project_ids` and `page` shared by most reports.
fn scope_filters(query: &mut Query, fields: &Params) {
    list_filter(query, "user_ids", fields, "userIds");
    list_filter(query, "project_ids", fields, "projectIds");
    page(query, fields);
}

fn list_filter(query: &mut Query, name: &str, fields: &Params, key: &str) {
    if let Some(ids) = fields.list(key) {
        query.insert(name, ids);
    }
}

/// Optional `{prefix}[start]` / `{prefix}[stop]` pair, each formatted by `format`.
fn optional_range(
    query: &mut Query,
    prefix: &str,
    start: Option<String>,
    stop: Option<String>,
    format: fn(&str) -> Result<String>,
) -> Result<()> {
    if let Some(start) = start {
        query.insert(format!("{prefix}[start]"), format(&start)?);
    }
    if let Some(stop) = stop {
        query.insert(format!("{prefix}[stop]"), format(&stop)?);
    }
    Ok(())
}

/// Required `startDate` / `stopDate` params as a `{prefix}[...]` range.
fn required_range(
    query: &mut Query,
    prefix: &str,
    params: &Params,
    format: fn(&str) -> Result<String>,
) -> Result<()> {
    let start = params.required("startDate")?;
    let stop = params.required("stopDate")?;
    optional_range(query, prefix, Some(start), Some(stop), format)
}

fn set_text(body: &mut Body, name: &str, value: Option<String>) {
    if let Some(value) = value {
        body.insert(name.to_string(), Value::String(value));
    }
}

fn set_date(body: &mut Body, name: &str, value: Option<String>) -> Result<()> {
    if let Some(value) = value {
        body.insert(name.to_string(), Value::String(format_date(&value)?));
    }
    Ok(())
}

fn set_ids(body: &mut Body, name: &str, ids: Option<Vec<String>>) {
    if let Some(ids) = ids {
        body.insert(name.to_string(), id_array(ids));
    }
}

/// IDs as a JSON array; numeric IDs are sent as numbers.
fn id_array(ids: Vec<String>) -> Value {
    Value::Array(
        ids.into_iter()
            .map(|id| match id.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(id),
            })
            .collect(),
    )
}

fn delete_ack(id_param: &str, id: &str, organization_id: &str) -> Value {
    json!({
        "success": true,
        id_param: id,
        "organizationId": organization_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::QueryValue;

    #[test]
    fn adapter_kind_parses_snake_case() {
        let kind: AdapterKind = serde_json::from_value(json!("organization_scoped")).unwrap();
        assert_eq!(kind, AdapterKind::OrganizationScoped);
        assert_eq!(AdapterKind::default(), AdapterKind::Legacy);
        assert_eq!(kind.build().name(), "organization_scoped");
        assert_eq!(AdapterKind::Legacy.build().name(), "legacy");
    }

    #[test]
    fn status_all_is_dropped() {
        let mut query = Query::new();
        status_filter(&mut query, &Params::new().with("status", "all"));
        assert!(query.is_empty());

        status_filter(&mut query, &Params::new().with("status", "archived"));
        assert_eq!(
            query.get("status"),
            Some(&QueryValue::Text("archived".into()))
        );
    }

    #[test]
    fn scope_filters_join_lists() {
        let mut query = Query::new();
        let fields = Params::new()
            .with("userIds", json!(["1", "2"]))
            .with("page", 3);
        scope_filters(&mut query, &fields);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "3".to_string()),
                ("user_ids".to_string(), "1,2".to_string()),
            ]
        );
    }

    #[test]
    fn ids_become_numbers_when_numeric() {
        assert_eq!(
            id_array(vec!["5".into(), "abc".into()]),
            json!([5, "abc"])
        );
    }

    #[test]
    fn delete_ack_shape() {
        assert_eq!(
            delete_ack("projectId", "9", "1"),
            json!({"success": true, "projectId": "9", "organizationId": "1"})
        );
    }
}
