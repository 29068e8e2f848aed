//! The request primitive every endpoint goes through.

use reqwest::Client;
use serde_json::Value;

use crate::config::{Config, ConfigError};
use crate::error::{classify, ApiError};
use crate::http::{self, Method, Query};
use crate::types::ApiResponse;

/// Authenticated DadDeck API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DadDeckClient {
    cfg: Config,
    http: Client,
}

impl DadDeckClient {
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let http = http::build_client(&cfg)?;
        Ok(Self { cfg, http })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// One authenticated exchange, decoded into an envelope or an [`ApiError`].
    ///
    /// Rate-limit headers are parsed for every completed exchange and attached
    /// to whichever side of the result is returned. No retries happen here.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let raw = http::execute(&self.http, &self.cfg, method, path, query, body).await?;
        let rate_limit = http::parse_rate_limit(&raw.headers);

        if !raw.is_success() {
            return Err(classify(raw.status, raw.body.as_ref(), rate_limit));
        }
        if raw.malformed {
            return Err(ApiError::invalid_response("response body is not valid JSON")
                .with_status(raw.status)
                .with_rate_limit(rate_limit));
        }
        Ok(ApiResponse::from_envelope(raw.body, rate_limit))
    }

    pub async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse, ApiError> {
        self.request(Method::Get, path, query, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::Post, path, query, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Delete, path, &Query::new(), None).await
    }
}
