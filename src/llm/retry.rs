//! Jittered exponential backoff.
//!
//! ```text
//! delay(n) = min(max_delay, max(retry_after, base · 2^(n-1) · m · (1 + jitter·u)))
//!
//!   n          attempt that just failed (1-based)
//!   m          rate_limit_multiplier for RateLimited, else 1
//!   u          uniform in [0, 1)
//! ```
//!
//! With `jitter < 1` the jittered ranges of consecutive attempts never
//! overlap, so delays strictly increase until they hit `max_delay`.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::pipeline::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
    pub rate_limit_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter.clamp(0.0, 0.999),
            rate_limit_multiplier: config.rate_limit_multiplier.max(1.0),
        }
    }
}

impl RetryPolicy {
    /// How long to wait after `attempt` failed with `kind`, or `None` when
    /// there is no further attempt (fatal error or budget exhausted).
    pub fn delay_for<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        kind: ErrorKind,
        retry_after: Option<Duration>,
        rng: &mut R,
    ) -> Option<Duration> {
        if !kind.is_retryable() || attempt >= self.max_attempts {
            return None;
        }
        let u: f64 = rng.gen();
        let jittered = self.nominal_secs(attempt, kind) * (1.0 + self.jitter * u);
        let floor = retry_after.map_or(0.0, |d| d.as_secs_f64());
        let capped = jittered.max(floor).min(self.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped))
    }

    /// Un-jittered, uncapped delay in seconds.
    fn nominal_secs(&self, attempt: u32, kind: ErrorKind) -> f64 {
        let exp = attempt.saturating_sub(1).min(32) as i32;
        let mut secs = self.base_delay.as_secs_f64() * 2f64.powi(exp);
        if kind == ErrorKind::RateLimited {
            secs *= self.rate_limit_multiplier;
        }
        secs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
