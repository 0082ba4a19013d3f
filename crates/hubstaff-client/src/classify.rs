//! Failure classification for Hubstaff API responses
//!
//! Maps a non-2xx status to an `ErrorCategory` and attaches the message and
//! description pair shown to the user. Only 422 surfaces the upstream message;
//! the other known statuses use fixed wording.

use provider::ErrorCategory;

use crate::error::ApiError;

pub const RATE_LIMIT_MESSAGE: &str =
    "Hubstaff API rate limit exceeded. You are allowed 1,000 requests per hour.";
const RATE_LIMIT_DESCRIPTION: &str =
    "Please wait before making more requests or reduce the frequency of your workflow.";

const AUTH_MESSAGE: &str = "Authentication failed. Please check your Personal Access Token.";
const AUTH_DESCRIPTION: &str = "Your token may be invalid or expired. Generate a new one at https://developer.hubstaff.com/";

const FORBIDDEN_MESSAGE: &str = "Access to this Hubstaff resource is forbidden.";
const FORBIDDEN_DESCRIPTION: &str = "Your role or Hubstaff plan may not include this feature. Check your subscription and organization permissions.";

const NOT_FOUND_MESSAGE: &str = "Resource not found.";
const NOT_FOUND_DESCRIPTION: &str =
    "The requested resource does not exist or you do not have access to it.";

const VALIDATION_MESSAGE: &str = "Validation error.";
const VALIDATION_DESCRIPTION: &str = "The data provided is invalid. Please check your input.";

/// Classify a non-success response.
pub fn classify_response(status: u16, body: &str) -> ApiError {
    let category = ErrorCategory::from_status(status);
    let (message, description): (String, String) = match category {
        ErrorCategory::RateLimited => (RATE_LIMIT_MESSAGE.into(), RATE_LIMIT_DESCRIPTION.into()),
        ErrorCategory::AuthenticationFailed => (AUTH_MESSAGE.into(), AUTH_DESCRIPTION.into()),
        ErrorCategory::Forbidden => (FORBIDDEN_MESSAGE.into(), FORBIDDEN_DESCRIPTION.into()),
        ErrorCategory::NotFound => (NOT_FOUND_MESSAGE.into(), NOT_FOUND_DESCRIPTION.into()),
        ErrorCategory::ValidationFailed => (
            VALIDATION_MESSAGE.into(),
            upstream_message(body).unwrap_or_else(|| VALIDATION_DESCRIPTION.into()),
        ),
        ErrorCategory::Generic => (
            format!("Hubstaff API request failed with status {status}"),
            upstream_message(body).unwrap_or_else(|| body_or_placeholder(body)),
        ),
    };

    ApiError {
        category,
        status: Some(status),
        message,
        description,
        body: body.to_string(),
    }
}

/// Wrap a transport-level failure (connect, timeout, broken body) as Generic.
pub fn transport_error(error: &reqwest::Error) -> ApiError {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    ApiError {
        category: ErrorCategory::Generic,
        status: error.status().map(|s| s.as_u16()),
        message: format!("Hubstaff API request {kind}"),
        description: error.to_string(),
        body: String::new(),
    }
}

/// Extract a human-readable message from an error body.
///
/// Accepts `{"message": ".."}`, `{"error": ".."}` and `{"error": {"message": ".."}}`.
fn upstream_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| json.get("error").and_then(|e| e.as_str()))
        .or_else(|| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
        })
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn body_or_placeholder(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::from("<no body>")
    } else {
        trimmed.to_string()
    }
}
