//! Batch execution
//!
//! Items run one after another against a single client. Output keeps input
//! order: one JSON value per item, or `{"error", "pairedItem": {"item"}}` for a failed
//! item when `continue_on_fail` is set.

use std::path::Path;

use hubstaff_client::{Client, Invocation};
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Read invocations from `path`, or stdin when absent.
///
/// Accepts a JSON array of invocations or a single invocation object.
pub async fn read_invocations(path: Option<&Path>) -> Result<Vec<Invocation>> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    parse_invocations(&raw)
}

pub fn parse_invocations(raw: &str) -> Result<Vec<Invocation>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

/// Run every invocation in order.
pub async fn run(
    client: &Client,
    invocations: &[Invocation],
    continue_on_fail: bool,
) -> Result<Vec<Value>> {
    let mut results = Vec::with_capacity(invocations.len());

    for (index, invocation) in invocations.iter().enumerate() {
        match client.execute(invocation).await {
            Ok(value) => {
                debug!(item = index, "item succeeded");
                results.push(value);
            }
            Err(e) if continue_on_fail => {
                warn!(item = index, error = %e, "item failed, continuing");
                results.push(json!({ "error": e.to_string(), "pairedItem": { "item": index } }));
            }
            Err(e) => {
                return Err(Error::ItemFailed {
                    index,
                    resource: invocation.resource.as_str(),
                    operation: invocation.operation.as_str(),
                    source: e,
                });
            }
        }
    }

    info!(items = results.len(), "batch finished");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;
    use hubstaff_client::{AdapterKind, Operation, Resource};
    use provider::StaticBearerProvider;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Client {
        Client::new(
            reqwest::Client::new(),
            Arc::new(StaticBearerProvider::new(Secret::from("pat"))),
            AdapterKind::Legacy.build(),
        )
        .with_base_url(server.uri())
    }

    fn batch() -> Vec<Invocation> {
        parse_invocations(
            r#"[
                {"resource": "user", "operation": "getCurrent"},
                {"resource": "project", "operation": "get", "params": {"organizationId": 1}},
                {"resource": "organization", "operation": "getAll"}
            ]"#,
        )
        .unwrap()
    }

    async fn mount_ok(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"id": 1}})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"organizations": []})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn parse_accepts_single_object() {
        let items =
            parse_invocations(r#"{"resource": "user", "operation": "getCurrent"}"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].resource, Resource::User);
        assert_eq!(items[0].operation, Operation::GetCurrent);
    }

    #[test]
    fn parse_rejects_unknown_operation() {
        let err = parse_invocations(r#"[{"resource": "user", "operation": "purge"}]"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(_)));
    }

    #[tokio::test]
    async fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"[{"resource": "organization", "operation": "getAll"}]"#)
            .unwrap();

        let items = read_invocations(Some(&path)).await.unwrap();
        assert_eq!(items[0].resource, Resource::Organization);
    }

    #[tokio::test]
    async fn continue_on_fail_records_failed_item() {
        let server = MockServer::start().await;
        mount_ok(&server).await;

        let results = run(&client(&server), &batch(), true).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], json!({"user": {"id": 1}}));
        assert_eq!(results[1]["pairedItem"], json!({"item": 1}));
        assert!(
            results[1]["error"]
                .as_str()
                .unwrap()
                .contains("projectId")
        );
        assert_eq!(results[2], json!({"organizations": []}));
    }

    #[tokio::test]
    async fn failure_aborts_without_continue_on_fail() {
        let server = MockServer::start().await;
        mount_ok(&server).await;

        let err = run(&client(&server), &batch(), false).await.unwrap_err();

        assert!(matches!(err, Error::ItemFailed { index: 1, .. }), "got: {err:?}");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "items after the failure must not run");
    }

    #[tokio::test]
    async fn api_error_message_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let items = parse_invocations(r#"[{"resource": "user", "operation": "getCurrent"}]"#)
            .unwrap();
        let results = run(&client(&server), &items, true).await.unwrap();
        assert_eq!(
            results,
            vec![json!({"error": "Resource not found.", "pairedItem": {"item": 0}})]
        );
    }
}
