//! Client configuration inputs.
//!
//! `Settings` carries process-wide defaults (typically loaded once from the
//! environment) and `ClientOptions` carries the explicit per-client values.
//! Both are plain values handed to a client constructor; nothing is read from
//! ambient global state during resolution.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Prefix of the environment variables read by `Settings::from_env`.
pub const ENV_PREFIX: &str = "VERICLIENT_";

/// Process-wide configuration defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub target: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
    pub environment: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

impl Settings {
    /// Reads `VERICLIENT_TARGET`, `VERICLIENT_APIKEY`, `VERICLIENT_TIMEOUT`
    /// (seconds), `VERICLIENT_ENVIRONMENT`, `VERICLIENT_LOCATION` and
    /// `VERICLIENT_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Builds settings from `(name, value)` pairs; names without the
    /// `VERICLIENT_` prefix are ignored, as are empty values.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(k, v)| {
                let key = k.as_ref().strip_prefix(ENV_PREFIX)?.to_ascii_uppercase();
                let value: String = v.into();
                (!value.trim().is_empty()).then(|| (key, value.trim().to_string()))
            })
            .collect();

        let timeout = match vars.get("TIMEOUT") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ApiError::Config(format!(
                        "{ENV_PREFIX}TIMEOUT must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            target: vars.get("TARGET").cloned(),
            api_key: vars.get("APIKEY").cloned(),
            timeout,
            environment: vars.get("ENVIRONMENT").cloned(),
            location: vars.get("LOCATION").cloned(),
            url: vars.get("URL").cloned(),
        })
    }
}

/// Explicit per-client configuration. Every field overrides the matching
/// `Settings` default.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub target: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
    pub environment: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `cloud` or `custom`. When unset, a URL selects a custom deployment.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// URL of a custom deployment; environment and location are ignored.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a header sent with every request of the client.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vars_reads_prefixed_values() {
        let settings = Settings::from_vars([
            ("VERICLIENT_TARGET", "cloud"),
            ("VERICLIENT_APIKEY", "key"),
            ("VERICLIENT_TIMEOUT", "30"),
            ("VERICLIENT_ENVIRONMENT", "production"),
            ("VERICLIENT_LOCATION", "us"),
            ("HOME", "/root"),
        ])
        .unwrap();
        assert_eq!(settings.target.as_deref(), Some("cloud"));
        assert_eq!(settings.api_key.as_deref(), Some("key"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.environment.as_deref(), Some("production"));
        assert_eq!(settings.location.as_deref(), Some("us"));
        assert!(settings.url.is_none());
    }

    #[test]
    fn from_vars_skips_blank_values() {
        let settings = Settings::from_vars([("VERICLIENT_URL", "  ")]).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn from_vars_rejects_bad_timeout() {
        let err = Settings::from_vars([("VERICLIENT_TIMEOUT", "soon")]).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn options_builder_collects_headers() {
        let options = ClientOptions::new()
            .target("custom")
            .api_key("k")
            .header("x-trace", "1")
            .header("x-tenant", "acme");
        assert_eq!(options.target.as_deref(), Some("custom"));
        assert_eq!(options.api_key.as_deref(), Some("k"));
        assert_eq!(options.headers.len(), 2);
        assert_eq!(options.headers[1], ("x-tenant".to_string(), "acme".to_string()));
    }
}
