//! Target resolution: which base URL a client talks to and with which
//! session headers.
//!
//! # Design
//! Each field is resolved with the precedence explicit option > settings
//! default > built-in fallback. The target kind comes first: a custom
//! deployment short-circuits cloud resolution completely, so an invalid
//! environment or location is never even parsed, and a cloud target ignores
//! any URL. Resolution runs once per client and the resulting `Target` is
//! immutable.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{ClientOptions, Settings};
use crate::error::{ApiError, Result};

/// Timeout used when neither the options nor the settings provide one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the authentication header.
pub const API_KEY_HEADER: &str = "apikey";

/// Logical APIs exposed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Daspeak,
    Vcsp,
}

impl Api {
    /// Path segment appended to the host.
    pub fn path(&self) -> &'static str {
        match self {
            Api::Daspeak => "daspeak/v1",
            Api::Vcsp => "vcsp/v1",
        }
    }
}

/// Kind of deployment a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Veridas cloud, addressed by environment and location.
    Cloud,
    /// Self-hosted deployment at an explicit URL.
    Custom,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Cloud, TargetKind::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Cloud => "cloud",
            TargetKind::Custom => "custom",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ApiError::Config(format!(
                    "invalid target: {s}. Valid options are: {}",
                    join(&Self::ALL)
                ))
            })
    }
}

/// Cloud environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Sandbox, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ApiError::Config(format!(
                    "invalid environment: {s}. Valid options are: {}",
                    join(&Self::ALL)
                ))
            })
    }
}

/// Cloud region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Eu,
    Us,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Eu, Location::Us];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Eu => "eu",
            Location::Us => "us",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ApiError::Config(format!(
                    "invalid location: {s}. Valid options are: {}",
                    join(&Self::ALL)
                ))
            })
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Host serving `environment` in `location`.
pub fn cloud_host(environment: Environment, location: Location) -> &'static str {
    match (environment, location) {
        (Environment::Sandbox, Location::Eu) => "https://api-work.eu.veri-das.com",
        (Environment::Sandbox, Location::Us) => "https://api-work.us.veri-das.com",
        (Environment::Production, Location::Eu) => "https://api.eu.veri-das.com",
        (Environment::Production, Location::Us) => "https://api.us.veri-das.com",
    }
}

/// Fully resolved connection target of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    headers: Vec<(String, String)>,
}

impl Target {
    /// Resolves the target of `api` from explicit options layered over
    /// settings defaults.
    pub fn resolve(api: Api, options: &ClientOptions, settings: &Settings) -> Result<Self> {
        let timeout = match options.timeout.or(settings.timeout) {
            Some(timeout) => timeout,
            None => {
                warn!(
                    seconds = DEFAULT_TIMEOUT.as_secs(),
                    "no timeout provided, using default"
                );
                DEFAULT_TIMEOUT
            }
        };
        let api_key = options
            .api_key
            .as_ref()
            .or(settings.api_key.as_ref())
            .filter(|key| !key.is_empty())
            .cloned();

        let url = options.url.as_ref().or(settings.url.as_ref());
        let host = match resolve_kind(options, settings, url.is_some())? {
            TargetKind::Custom => custom_host(url)?,
            TargetKind::Cloud => {
                if url.is_some() {
                    debug!("cloud target selected, ignoring the custom url");
                }
                let environment = resolve_environment(options, settings)?;
                let location = resolve_location(options, settings)?;
                if api_key.is_none() {
                    return Err(ApiError::Config(
                        "an api key must be provided when targeting the cloud".to_string(),
                    ));
                }
                cloud_host(environment, location).to_string()
            }
        };

        let mut headers = Vec::with_capacity(options.headers.len() + 1);
        if let Some(key) = &api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }
        headers.extend(options.headers.iter().cloned());

        Ok(Self {
            base_url: format!("{host}/{}", api.path()),
            api_key,
            timeout,
            headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Session headers attached to every request.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Absolute URL of `path` under this target.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Without an explicit kind, a configured URL implies a custom deployment.
fn resolve_kind(options: &ClientOptions, settings: &Settings, has_url: bool) -> Result<TargetKind> {
    match options.target.as_ref().or(settings.target.as_ref()) {
        Some(raw) => raw.parse(),
        None if has_url => Ok(TargetKind::Custom),
        None => {
            warn!("no target provided, defaulting to cloud");
            Ok(TargetKind::Cloud)
        }
    }
}

fn custom_host(url: Option<&String>) -> Result<String> {
    let url = url.map(|url| url.trim()).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::Config(
            "a url must be provided when targeting a custom deployment".to_string(),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn resolve_environment(options: &ClientOptions, settings: &Settings) -> Result<Environment> {
    match options.environment.as_ref().or(settings.environment.as_ref()) {
        Some(raw) => raw.parse(),
        None => {
            warn!("no environment provided, defaulting to sandbox");
            Ok(Environment::Sandbox)
        }
    }
}

fn resolve_location(options: &ClientOptions, settings: &Settings) -> Result<Location> {
    match options.location.as_ref().or(settings.location.as_ref()) {
        Some(raw) => raw.parse(),
        None => {
            warn!("no location provided, defaulting to EU");
            Ok(Location::Eu)
        }
    }
}
