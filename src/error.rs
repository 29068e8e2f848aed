//! Structured errors surfaced by every client call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::types::RateLimitInfo;

pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const TIMEOUT: &str = "TIMEOUT";
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const MAX_RETRIES: &str = "MAX_RETRIES";
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";

const DEFAULT_CODE: &str = "API_ERROR";
const DEFAULT_MESSAGE: &str = "Unknown error";

/// Used when a rate-limited response did not say when the window resets.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(60_000);

/// An API failure as seen by the caller.
///
/// Transport failures (`TIMEOUT`, `NETWORK_ERROR`) never carry a status;
/// server errors carry whatever code the server reported, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("[{code}] {message}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Set only on `MAX_RETRIES`: the failure that exhausted the budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<Box<ApiError>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            http_status: None,
            rate_limit: None,
            request_id: None,
            last_error: None,
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            TIMEOUT,
            format!("Request timed out after {}s", timeout.as_secs_f64()),
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(INVALID_RESPONSE, message)
    }

    /// Terminal error raised by the retry loop. Status, quota snapshot and
    /// request id are lifted from the last failure so callers need not dig.
    pub fn max_retries(last: Option<ApiError>) -> Self {
        let mut err = Self::new(MAX_RETRIES, "Maximum retries exceeded");
        if let Some(last) = last {
            err.http_status = last.http_status;
            err.rate_limit = last.rate_limit.clone();
            err.request_id = last.request_id.clone();
            err.last_error = Some(Box::new(last));
        }
        err
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_rate_limit_error(&self) -> bool {
        self.code == RATE_LIMIT_EXCEEDED
    }

    pub fn is_auth_error(&self) -> bool {
        self.code == UNAUTHORIZED
    }

    pub fn is_max_retries(&self) -> bool {
        self.code == MAX_RETRIES
    }

    /// How long to wait before retrying, measured against the clock right now.
    ///
    /// Never cached: asking again later yields a smaller delay.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay_at(Utc::now())
    }

    pub fn retry_delay_at(&self, now: DateTime<Utc>) -> Duration {
        match self.rate_limit.as_ref().and_then(|rl| rl.reset_at) {
            Some(reset_at) => {
                let ms = (reset_at - now).num_milliseconds().max(0);
                Duration::from_millis(ms as u64)
            }
            None => DEFAULT_RETRY_DELAY,
        }
    }
}

/// Map a non-2xx response to an [`ApiError`].
///
/// `body` is the parsed JSON body, if it parsed at all.
pub fn classify(status: u16, body: Option<&Value>, rate_limit: Option<RateLimitInfo>) -> ApiError {
    let error = body.and_then(|b| b.get("error"));
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CODE);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MESSAGE);
    let request_id = body
        .and_then(|b| b.get("meta"))
        .and_then(|m| m.get("requestId"))
        .and_then(Value::as_str);

    let mut err = ApiError::new(code, message)
        .with_status(status)
        .with_rate_limit(rate_limit);
    if let Some(id) = request_id {
        err = err.with_request_id(id);
    }
    err
}
