//! Request descriptor handed to the dispatcher

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::{Map, Value};

/// JSON object sent as the request body. Empty means "no body".
pub type Body = Map<String, Value>;

/// A single query-string value. Lists are sent comma-joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Number(i64),
    Bool(bool),
    List(Vec<String>),
}

impl QueryValue {
    pub fn render(&self) -> String {
        match self {
            QueryValue::Text(s) => s.clone(),
            QueryValue::Number(n) => n.to_string(),
            QueryValue::Bool(b) => b.to_string(),
            QueryValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Number(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

/// Query parameters, ordered by key so the wire form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, QueryValue>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rendered `(key, value)` pairs for `reqwest::RequestBuilder::query`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.render()))
            .collect()
    }
}

/// One Hubstaff API call: method, endpoint path, query and body.
///
/// `endpoint` is relative to the API base URL and must start with `/`; the
/// dispatcher rejects anything else before touching the network.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Query,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Query::new(),
            body: Body::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Body) -> Self {
        Self::new(Method::POST, endpoint).with_body(body)
    }

    pub fn put(endpoint: impl Into<String>, body: Body) -> Self {
        Self::new(Method::PUT, endpoint).with_body(body)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}
