//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the session. Services
//! never read environment variables themselves; the binaries do that and hand the raw values to
//! [`RelayConfig::from_env_values`].

use crate::constants::{
    DEFAULT_USERS_URL, DEFAULT_WEBHOOK_URL, GUARD_SETTLE, NOTIFICATION_AUTO_HIDE, REQUEST_TIMEOUT,
    RESET_DELAY,
};
use crate::{RelayError, RelayResult};
use std::time::Duration;
use url::Url;

/// Fixed delays used by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    pub notification_auto_hide: Duration,
    pub reset_delay: Duration,
    pub guard_settle: Duration,
    pub request_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            notification_auto_hide: NOTIFICATION_AUTO_HIDE,
            reset_delay: RESET_DELAY,
            guard_settle: GUARD_SETTLE,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Endpoints and timings for one form session.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    users_url: String,
    webhook_url: String,
    timings: Timings,
}

impl RelayConfig {
    /// Create a new `RelayConfig` with the default timings.
    ///
    /// Both URLs must be absolute `http://` or `https://` URLs.
    pub fn new(users_url: impl Into<String>, webhook_url: impl Into<String>) -> RelayResult<Self> {
        let users_url = users_url.into();
        let webhook_url = webhook_url.into();

        validate_endpoint("users_url", &users_url)?;
        validate_endpoint("webhook_url", &webhook_url)?;

        Ok(Self {
            users_url,
            webhook_url,
            timings: Timings::default(),
        })
    }

    /// Build a config from optional raw values, typically read from the environment.
    ///
    /// `None` or blank values fall back to the local development endpoints.
    pub fn from_env_values(
        users_url: Option<String>,
        webhook_url: Option<String>,
    ) -> RelayResult<Self> {
        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }

        Self::new(
            or_default(users_url, DEFAULT_USERS_URL),
            or_default(webhook_url, DEFAULT_WEBHOOK_URL),
        )
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn users_url(&self) -> &str {
        &self.users_url
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }
}

fn validate_endpoint(name: &str, raw: &str) -> RelayResult<()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RelayError::InvalidConfig(format!("{name} cannot be empty")));
    }

    let url = Url::parse(raw)
        .map_err(|e| RelayError::InvalidConfig(format!("{name} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::InvalidConfig(format!(
            "{name} must start with http:// or https://"
        )));
    }
    if !url.has_host() {
        return Err(RelayError::InvalidConfig(format!("{name} has no host")));
    }

    Ok(())
}
