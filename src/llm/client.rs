//! Correction client adapter: one attempt at a time, classified.
//!
//! [`CorrectionClient`] wraps any [`CorrectionService`] with a per-attempt
//! timeout, turns every failure into an [`AttemptError`] tagged with its
//! [`ErrorKind`] and retryability, and answers "how long until the next
//! attempt?" through [`RetryPolicy`].  The orchestrator owns the loop so it
//! can publish `Correcting(n)` and honour cancellation between attempts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::corrector::{CorrectionService, LlmError};
use super::retry::RetryPolicy;
use crate::config::AppConfig;
use crate::pipeline::ErrorKind;

/// A classified failure of one attempt.
#[derive(Debug, Clone)]
pub struct AttemptError {
    pub kind: ErrorKind,
    pub retryable: bool,
    pub retry_after: Option<Duration>,
    pub message: String,
}

impl From<LlmError> for AttemptError {
    fn from(e: LlmError) -> Self {
        let kind = e.kind();
        Self {
            kind,
            retryable: kind.is_retryable(),
            retry_after: e.retry_after(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.message)
    }
}

pub struct CorrectionClient {
    service: Arc<dyn CorrectionService>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    rng: Mutex<StdRng>,
}

impl CorrectionClient {
    pub fn new(
        service: Arc<dyn CorrectionService>,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            service,
            policy,
            attempt_timeout,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(service: Arc<dyn CorrectionService>, config: &AppConfig) -> Self {
        Self::new(
            service,
            RetryPolicy::from(&config.retry),
            Duration::from_secs(config.llm.timeout_secs.max(1)),
        )
    }

    /// Deterministic jitter, for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    /// Run attempt number `attempt` (1-based).
    ///
    /// # Errors
    ///
    /// Any service failure, a timeout, or a blank result
    /// ([`ErrorKind::EmptyResponse`], never retried).
    pub async fn correct(
        &self,
        prompt: &str,
        text: &str,
        attempt: u32,
    ) -> Result<String, AttemptError> {
        log::debug!(
            "llm: attempt {attempt}/{} ({} chars)",
            self.policy.max_attempts,
            text.chars().count()
        );

        let result =
            match tokio::time::timeout(self.attempt_timeout, self.service.correct(prompt, text))
                .await
            {
                Ok(result) => result,
                Err(_elapsed) => Err(LlmError::Timeout),
            };

        match result {
            Ok(corrected) if corrected.trim().is_empty() => Err(LlmError::EmptyResponse.into()),
            Ok(corrected) => Ok(corrected),
            Err(e) => {
                let err = AttemptError::from(e);
                log::warn!("llm: attempt {attempt} failed: {err}");
                Err(err)
            }
        }
    }

    /// Delay before the attempt after `attempt`, or `None` when `err` ends
    /// the job.
    pub fn retry_delay(&self, attempt: u32, err: &AttemptError) -> Option<Duration> {
        if !err.retryable {
            return None;
        }
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.policy
            .delay_for(attempt, err.kind, err.retry_after, &mut *rng)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
