//! Service configuration: endpoints, current-protocol auth mode, cache
//! bounds and transport timeouts. Loadable from a JSON file; every field
//! has a default.

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::translate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::translate::current::DEFAULT_CURRENT_URL;
use crate::translate::legacy::DEFAULT_LEGACY_URL;
use crate::translate::token::DEFAULT_TOKEN_URL;
use crate::translate::CurrentAuth;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub token_url: String,
    pub legacy_url: String,
    pub current_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.into(),
            legacy_url: DEFAULT_LEGACY_URL.into(),
            current_url: DEFAULT_CURRENT_URL.into(),
        }
    }
}

impl Endpoints {
    /// All three endpoints under one base URL, with the vendor's paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token_url: format!("{base}/sts/v1.0/issueToken"),
            legacy_url: format!("{base}/v2/http.svc/Translate"),
            current_url: format!("{base}/translate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoints: Endpoints,
    pub current_auth: CurrentAuth,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            current_auth: CurrentAuth::Key,
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be > 0".into()));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        let urls = [
            ("token_url", &self.endpoints.token_url),
            ("legacy_url", &self.endpoints.legacy_url),
            ("current_url", &self.endpoints.current_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| ConfigError::Invalid("cache_capacity must be > 0".into()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ServiceConfig::from_json("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.current_auth, CurrentAuth::Key);
    }

    #[test]
    fn partial_override() {
        let config = ServiceConfig::from_json(
            r#"{"current_auth": "token", "endpoints": {"token_url": "http://localhost/t"}, "request_timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.current_auth, CurrentAuth::Token);
        assert_eq!(config.endpoints.token_url, "http://localhost/t");
        assert_eq!(config.endpoints.legacy_url, DEFAULT_LEGACY_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = ServiceConfig::from_json(r#"{"cache_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_blank_url() {
        let err = ServiceConfig::from_json(r#"{"endpoints": {"current_url": " "}}"#).unwrap_err();
        assert!(err.to_string().contains("current_url"));
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(
            ServiceConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn base_url_endpoints() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:8080/");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:8080/sts/v1.0/issueToken");
        assert_eq!(endpoints.legacy_url, "http://127.0.0.1:8080/v2/http.svc/Translate");
        assert_eq!(endpoints.current_url, "http://127.0.0.1:8080/translate");
    }
}
