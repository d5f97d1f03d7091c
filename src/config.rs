use anyhow::{Context, Result};
use log::debug;
use std::time::Duration;

use crate::http::RetryPolicy;
use crate::runtime::Runtime;

/// Endpoint template used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://{service}.{region}.gs2.io";

/// Connect and read timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENDPOINT_ENV: &str = "GS2_ENDPOINT";
pub const MAX_ATTEMPTS_ENV: &str = "GS2_MAX_ATTEMPTS";
pub const RETRY_DELAY_MS_ENV: &str = "GS2_RETRY_DELAY_MS";
pub const TIMEOUT_SECS_ENV: &str = "GS2_TIMEOUT_SECS";

/// Transport and retry settings shared by every call of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// URL template with `{service}` and `{region}` placeholders.
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Longest wait for any single read of the response. A slow response
    /// that keeps delivering data is never cut off.
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            user_agent: format!("gs2-client/{}", env!("GS2_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.read_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Defaults overridden by `GS2_ENDPOINT`, `GS2_MAX_ATTEMPTS`,
    /// `GS2_RETRY_DELAY_MS` and `GS2_TIMEOUT_SECS` when set.
    pub fn from_env<R: Runtime + ?Sized>(runtime: &R) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(endpoint) = runtime.env_var(ENDPOINT_ENV) {
            debug!("Using endpoint from {}: {}", ENDPOINT_ENV, endpoint);
            config = config.with_endpoint(endpoint);
        }

        let mut retry = config.retry;
        if let Some(max_attempts) = parse_env::<usize, R>(runtime, MAX_ATTEMPTS_ENV)? {
            retry = RetryPolicy::new(max_attempts, retry.delay);
        }
        if let Some(delay_ms) = parse_env::<u64, R>(runtime, RETRY_DELAY_MS_ENV)? {
            retry = RetryPolicy::new(retry.max_attempts, Duration::from_millis(delay_ms));
        }
        config.retry = retry;

        if let Some(secs) = parse_env::<u64, R>(runtime, TIMEOUT_SECS_ENV)? {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_env<T, R>(runtime: &R, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: Runtime + ?Sized,
{
    match runtime.env_var(key) {
        Ok(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, value))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
