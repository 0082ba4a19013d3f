//! Hubstaff API v2 client
//!
//! Translates `(resource, operation, params)` invocations into single REST
//! calls. An `EndpointAdapter` decides the path, query and body; `Client`
//! dispatches the call with credentials from a `provider::Provider` and
//! classifies failures into user-facing categories.
//!
//! Two adapters exist because the API has two incompatible mappings for the
//! same resources:
//! - `legacy`: organization ID per invocation, `date[...]` filters
//! - `organization_scoped`: organization ID from the credential, renamed
//!   endpoints (`timesheets`, `client_invoices`, ...) and `time_slot[...]`
//!   filters where the API expects them

pub mod adapter;
pub mod classify;
pub mod client;
pub mod error;
pub mod format;
pub mod request;
pub mod resource;

pub use adapter::{AdapterContext, AdapterKind, EndpointAdapter, Plan};
pub use classify::{RATE_LIMIT_MESSAGE, classify_response};
pub use client::{API_BASE_URL, Client};
pub use error::{ApiError, Error, Result};
pub use provider::ErrorCategory;
pub use request::{ApiRequest, Body, Query, QueryValue};
pub use resource::{Invocation, Operation, Params, Resource};
