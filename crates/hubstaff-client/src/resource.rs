//! Invocation model: which resource, which operation, with which parameters

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Organization,
    Project,
    Activity,
    TimeEntry,
    Member,
    User,
    Task,
    Screenshot,
    Note,
    Client,
    Invoice,
    Schedule,
    Todo,
    Application,
    Url,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Organization => "organization",
            Resource::Project => "project",
            Resource::Activity => "activity",
            Resource::TimeEntry => "timeEntry",
            Resource::Member => "member",
            Resource::User => "user",
            Resource::Task => "task",
            Resource::Screenshot => "screenshot",
            Resource::Note => "note",
            Resource::Client => "client",
            Resource::Invoice => "invoice",
            Resource::Schedule => "schedule",
            Resource::Todo => "todo",
            Resource::Application => "application",
            Resource::Url => "url",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Get,
    GetAll,
    GetCurrent,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::GetAll => "getAll",
            Operation::GetCurrent => "getCurrent",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied parameters for one invocation.
///
/// Top-level keys hold required inputs (`organizationId`, `projectId`, ...).
/// Optional inputs live in the `additionalFields`, `updateFields` and
/// `filters` sections. Strings and numbers are interchangeable for IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

/// Reject values that would leave their path segment.
pub(crate) fn path_segment(key: &str, value: &str) -> Result<()> {
    if value.contains(['/', '?', '#']) {
        return Err(Error::Validation(format!(
            "parameter '{key}' must not contain '/', '?' or '#'"
        )));
    }
    Ok(())
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by callers assembling params in code.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A required, non-empty scalar.
    pub fn required(&self, key: &str) -> Result<String> {
        self.text(key)
            .ok_or_else(|| Error::Validation(format!("missing required parameter '{key}'")))
    }

    /// A required identifier that is safe to place in a URL path.
    pub fn id(&self, key: &str) -> Result<String> {
        let id = self.required(key)?;
        path_segment(key, &id)?;
        Ok(id)
    }

    /// A non-empty scalar rendered as text. Empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.present_text(key).filter(|s| !s.is_empty())
    }

    /// A scalar rendered as text, kept even when empty.
    ///
    /// Used for fields that may be deliberately cleared on update.
    pub fn present_text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// A boolean, accepting `true`/`false` strings.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A non-zero integer. Numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<i64> {
        let n = match self.0.get(key)? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        (n != 0).then_some(n)
    }

    /// A list of IDs from an array or a comma-separated string.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.0.get(key)? {
            Value::Array(values) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Value::Number(n) => vec![n.to_string()],
            _ => return None,
        };
        (!items.is_empty()).then_some(items)
    }

    /// A nested section such as `additionalFields`. Missing sections are empty.
    pub fn section(&self, key: &str) -> Params {
        match self.0.get(key) {
            Some(Value::Object(map)) => Params(map.clone()),
            _ => Params::new(),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params(map)
    }
}

/// One `(resource, operation, params)` call as read from a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub resource: Resource,
    pub operation: Operation,
    #[serde(default)]
    pub params: Params,
}

impl Invocation {
    pub fn new(resource: Resource, operation: Operation, params: Params) -> Self {
        Self {
            resource,
            operation,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invocation_deserializes_camel_case() {
        let invocation: Invocation = serde_json::from_value(json!({
            "resource": "timeEntry",
            "operation": "getAll",
            "params": {"organizationId": 12}
        }))
        .unwrap();
        assert_eq!(invocation.resource, Resource::TimeEntry);
        assert_eq!(invocation.operation, Operation::GetAll);
        assert_eq!(invocation.params.required("organizationId").unwrap(), "12");
    }

    #[test]
    fn params_default_to_empty() {
        let invocation: Invocation =
            serde_json::from_value(json!({"resource": "user", "operation": "getCurrent"})).unwrap();
        assert_eq!(invocation.params, Params::new());
    }

    #[test]
    fn unknown_resource_rejected() {
        let result: std::result::Result<Invocation, _> =
            serde_json::from_value(json!({"resource": "invoices", "operation": "get"}));
        assert!(result.is_err());
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let params = Params::new().with("projectId", "  ");
        let err = params.required("projectId").unwrap_err();
        assert!(err.to_string().contains("projectId"));
        assert!(params.required("organizationId").is_err());
    }

    #[test]
    fn id_rejects_path_characters() {
        let params = Params::new()
            .with("projectId", "1/../../users/me")
            .with("taskId", "5?x=1")
            .with("noteId", "9#frag")
            .with("clientId", 12);
        for key in ["projectId", "taskId", "noteId"] {
            let err = params.id(key).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{key}: {err:?}");
            assert!(err.to_string().contains(key));
        }
        assert_eq!(params.id("clientId").unwrap(), "12");
        assert!(params.id("userId").is_err());
    }

    #[test]
    fn present_text_keeps_empty_string() {
        let params = Params::new().with("description", "");
        assert_eq!(params.present_text("description").as_deref(), Some(""));
        assert!(params.text("description").is_none());
    }

    #[test]
    fn list_accepts_array_and_csv() {
        let params = Params::new()
            .with("userIds", json!([1, "2", ""]))
            .with("projectIds", "7, 8,")
            .with("empty", json!([]));
        assert_eq!(params.list("userIds").unwrap(), vec!["1", "2"]);
        assert_eq!(params.list("projectIds").unwrap(), vec!["7", "8"]);
        assert!(params.list("empty").is_none());
    }

    #[test]
    fn number_ignores_zero() {
        let params = Params::new().with("page", 0).with("next", "3");
        assert!(params.number("page").is_none());
        assert_eq!(params.number("next"), Some(3));
    }

    #[test]
    fn flag_reads_bool_and_string() {
        let params = Params::new()
            .with("billable", false)
            .with("includeRemoved", "true");
        assert_eq!(params.flag("billable"), Some(false));
        assert_eq!(params.flag("includeRemoved"), Some(true));
        assert_eq!(params.flag("missing"), None);
    }

    #[test]
    fn missing_section_is_empty() {
        let params = Params::new().with("filters", json!({"status": "active"}));
        assert_eq!(params.section("filters").text("status").as_deref(), Some("active"));
        assert_eq!(params.section("additionalFields"), Params::new());
    }
}
