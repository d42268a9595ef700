//! Core `CorrectionService` trait and `ApiCorrector` implementation.
//!
//! `ApiCorrector` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint.  All connection details come from [`LlmConfig`]; nothing is
//! hardcoded.  Failures are classified into [`LlmError`] so the retry
//! policy can tell transient trouble from a rejected request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::prompt::{ChatRequest, ChatResponse};
use crate::pipeline::ErrorKind;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during one correction request.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Transport failure: DNS, refused or reset connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete within the per-attempt budget.
    #[error("request timed out")]
    Timeout,

    /// The service rejected our credentials (401/403).
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Throttled (429).
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Transient upstream outage (5xx).
    #[error("service unavailable: HTTP {status}")]
    ServiceUnavailable {
        status: u16,
        retry_after: Option<Duration>,
    },

    /// Any other 4xx, or a request that could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body was not the expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The response carried no usable text.
    #[error("service returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Classify a non-success HTTP status.
    ///
    /// ```
    /// use text_corrector::llm::LlmError;
    /// use text_corrector::pipeline::ErrorKind;
    ///
    /// assert_eq!(LlmError::from_status(401, None, "").kind(), ErrorKind::AuthFailure);
    /// assert_eq!(LlmError::from_status(429, None, "").kind(), ErrorKind::RateLimited);
    /// assert_eq!(LlmError::from_status(503, None, "").kind(), ErrorKind::ServiceUnavailable);
    /// assert_eq!(LlmError::from_status(422, None, "").kind(), ErrorKind::InvalidRequest);
    /// ```
    pub fn from_status(status: u16, retry_after: Option<Duration>, body: &str) -> Self {
        let detail = summarize_body(status, body);
        match status {
            401 | 403 => LlmError::Auth(detail),
            408 => LlmError::Timeout,
            429 => LlmError::RateLimited { retry_after },
            500..=599 => LlmError::ServiceUnavailable {
                status,
                retry_after,
            },
            _ => LlmError::InvalidRequest(detail),
        }
    }

    /// Position in the pipeline error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Connection(_) => ErrorKind::ConnectionFailure,
            LlmError::Timeout => ErrorKind::Timeout,
            LlmError::Auth(_) => ErrorKind::AuthFailure,
            LlmError::RateLimited { .. } => ErrorKind::RateLimited,
            LlmError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            LlmError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            LlmError::Parse(_) | LlmError::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Server-supplied minimum wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after }
            | LlmError::ServiceUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if let Some(status) = e.status() {
            LlmError::from_status(status.as_u16(), None, "")
        } else if e.is_decode() {
            LlmError::Parse(e.to_string())
        } else if e.is_builder() {
            LlmError::InvalidRequest(e.to_string())
        } else {
            LlmError::Connection(e.to_string())
        }
    }
}

/// `Retry-After` in delta-seconds form.  HTTP-date values are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn summarize_body(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let snippet: String = body.chars().take(200).collect();
    format!("HTTP {status}: {snippet}")
}

// ---------------------------------------------------------------------------
// CorrectionService trait
// ---------------------------------------------------------------------------

/// Async trait for a single correction request.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn CorrectionService>`).  One call is one
/// attempt; retrying is the caller's business.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn correct(&self, prompt: &str, text: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiCorrector
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `model`) come exclusively
/// from the [`LlmConfig`] passed to [`ApiCorrector::from_config`].
pub struct ApiCorrector {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiCorrector {
    /// Build an `ApiCorrector` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CorrectionService for ApiCorrector {
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is a non-empty string.
    async fn correct(&self, prompt: &str, text: &str) -> Result<String, LlmError> {
        let body = ChatRequest::correction(&self.config.model, self.config.temperature, prompt, text);

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), retry_after, &body));
        }

        // Read the whole body first: losing the connection here is a
        // transport failure, only a complete but malformed body is `Parse`.
        let body = response.bytes().await.map_err(interrupted_body)?;
        parse_completion(&body)
    }
}

/// Classify a failure while streaming a 2xx response body.
fn interrupted_body(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Connection(format!("response body interrupted: {e}"))
    }
}

/// Decode a complete chat-completions body into the corrected text.
fn parse_completion(body: &[u8]) -> Result<String, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_slice(body).map_err(|e| LlmError::Parse(e.to_string()))?;
    parsed.into_text().ok_or(LlmError::EmptyResponse)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
