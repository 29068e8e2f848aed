use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Quota snapshot taken from the X-RateLimit-* headers of a single response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: Option<DateTime<Utc>>,
    pub tier: String,
}

/// Decoded response envelope. `success()` holds iff the envelope carried no error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub data: Option<Value>,
    pub error: Option<Value>,
    pub meta: Option<Value>,
    pub rate_limit: Option<RateLimitInfo>,
}

impl ApiResponse {
    /// Build a response from a parsed envelope; JSON `null` fields count as absent.
    pub fn from_envelope(body: Option<Value>, rate_limit: Option<RateLimitInfo>) -> Self {
        let mut body = body.unwrap_or(Value::Null);
        let mut field = |name: &str| {
            body.as_object_mut()
                .and_then(|obj| obj.remove(name))
                .filter(|v| !v.is_null())
        };
        Self {
            data: field("data"),
            error: field("error"),
            meta: field("meta"),
            rate_limit,
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiTier {
    #[default]
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl ApiTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiTier::Free => "free",
            ApiTier::Basic => "basic",
            ApiTier::Pro => "pro",
            ApiTier::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for ApiTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(ApiTier::Free),
            "basic" => Ok(ApiTier::Basic),
            "pro" => Ok(ApiTier::Pro),
            "enterprise" => Ok(ApiTier::Enterprise),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}
