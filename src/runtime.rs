//! Runtime abstraction for the clock, backoff sleeps and environment lookup.
//!
//! Everything the request pipeline needs from the outside world besides the
//! network goes through [`Runtime`], so tests can pin the timestamp and count
//! sleeps without waiting.

use async_trait::async_trait;
use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, env::VarError>;

    // Clock
    /// Seconds since the Unix epoch, used as the signature timestamp.
    fn unix_timestamp(&self) -> u64;

    /// Waits between retry attempts.
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    #[tracing::instrument(skip(self))]
    fn env_var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    fn unix_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
