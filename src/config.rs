use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.dadddeck.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing API key (set DADDECK_API_KEY)")]
    MissingApiKey,
    #[error("invalid base URL {0:?}: {1}")]
    InvalidBaseUrl(String, String),
    #[error("{0} contains characters not allowed in an HTTP header")]
    InvalidHeader(&'static str),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Runtime configuration for the DadDeck API client.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - DADDECK_API_KEY [required]
    /// - DADDECK_API_URL (default: https://api.dadddeck.com/v1)
    /// - DADDECK_HTTP_TIMEOUT_SECS (default: 30)
    /// - DADDECK_USER_AGENT (default: dadddeck-api/<version>)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("DADDECK_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;
        let mut cfg = Self::new(api_key);
        if let Ok(url) = env::var("DADDECK_API_URL") {
            cfg = cfg.with_base_url(url);
        }
        if let Some(secs) = env::var("DADDECK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg = cfg.with_timeout(Duration::from_secs(secs));
        }
        if let Ok(ua) = env::var("DADDECK_USER_AGENT") {
            cfg = cfg.with_user_agent(ua);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(self.base_url.clone(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(
                self.base_url.clone(),
                "scheme must be http or https".into(),
            ));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("dadddeck-api/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::new("ddpk_test");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.user_agent.starts_with("dadddeck-api/"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn base_url_trailing_slash_stripped() {
        let cfg = Config::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn validate_rejects_bad_input() {
        assert!(matches!(
            Config::new("  ").validate(),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::new("k").with_base_url("not a url").validate(),
            Err(ConfigError::InvalidBaseUrl(..))
        ));
        assert!(matches!(
            Config::new("k").with_base_url("ftp://api.example.com").validate(),
            Err(ConfigError::InvalidBaseUrl(..))
        ));
    }
}
