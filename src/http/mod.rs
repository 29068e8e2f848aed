use crate::config::{Config, ConfigError};
use crate::error::ApiError;
use crate::types::RateLimitInfo;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::fmt;

pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RATE_TIER: &str = "x-ratelimit-tier";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// Query string entries in insertion order. Absent and empty values are
/// dropped on insert so they never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.0.retain(|(k, _)| k != key);
            self.0.push((key.to_string(), value));
        }
        self
    }

    pub fn set_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// A completed exchange, before any envelope or status interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
    /// True when a non-empty body failed to parse as JSON.
    pub malformed: bool,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Build the shared client. Credentials and content type are fixed here and
/// never mutated afterwards, so the client can be cloned across tasks.
pub fn build_client(cfg: &Config) -> Result<Client, ConfigError> {
    let mut default_headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
        .map_err(|_| ConfigError::InvalidHeader("api key"))?;
    auth.set_sensitive(true);
    default_headers.insert(AUTHORIZATION, auth);
    default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|_| ConfigError::InvalidHeader("user agent"))?;
    default_headers.insert(USER_AGENT, ua);

    Client::builder()
        .default_headers(default_headers)
        .timeout(cfg.timeout)
        .use_rustls_tls()
        .build()
        .map_err(ConfigError::Http)
}

fn transport_error(cfg: &Config, e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(cfg.timeout)
    } else {
        ApiError::network(e.to_string())
    }
}

/// Join `path` onto the configured base with exactly one slash between them.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Percent-encode a caller-supplied id for use as a single path segment.
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Issue exactly one HTTP exchange. The per-request timeout comes from the
/// client, so every call (and every retry attempt) gets a fresh clock.
pub async fn execute(
    client: &Client,
    cfg: &Config,
    method: Method,
    path: &str,
    query: &Query,
    body: Option<&Value>,
) -> Result<RawResponse, ApiError> {
    let url = endpoint_url(&cfg.base_url, path);
    let mut req = client.request(method.as_reqwest(), &url);
    if !query.is_empty() {
        req = req.query(query.pairs());
    }
    if let Some(b) = body {
        req = req.json(b);
    }

    let res = req.send().await.map_err(|e| transport_error(cfg, e))?;
    let status = res.status().as_u16();
    let headers = res.headers().clone();
    let text = res.text().await.map_err(|e| transport_error(cfg, e))?;
    debug!("{} {} -> {} ({} bytes)", method, url, status, text.len());

    let (body, malformed) = if text.trim().is_empty() {
        (None, false)
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(v) => (Some(v), false),
            Err(_) => (None, true),
        }
    };
    Ok(RawResponse {
        status,
        headers,
        body,
        malformed,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extract quota state from response headers.
///
/// Returns `None` when the server did not report a limit.
pub fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let limit = header_str(headers, HEADER_RATE_LIMIT)?.parse::<u64>().ok()?;
    let remaining = header_str(headers, HEADER_RATE_REMAINING)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);
    let reset_at = header_str(headers, HEADER_RATE_RESET)
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|epoch| chrono::DateTime::<chrono::Utc>::from_timestamp(epoch, 0));
    let tier = header_str(headers, HEADER_RATE_TIER)
        .unwrap_or("unknown")
        .to_string();
    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
        tier,
    })
}
