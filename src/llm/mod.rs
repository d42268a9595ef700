//! Correction service client.
//!
//! This module provides:
//! * [`CorrectionService`]: async trait for one correction request.
//! * [`ApiCorrector`]: OpenAI-compatible REST implementation.
//! * [`LlmError`]: classified request failures.
//! * [`RetryPolicy`]: jittered exponential backoff.
//! * [`CorrectionClient`]: per-attempt adapter the pipeline drives.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use text_corrector::config::AppConfig;
//! use text_corrector::llm::{ApiCorrector, CorrectionClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let service = Arc::new(ApiCorrector::from_config(&config.llm));
//!     let client = CorrectionClient::from_config(service, &config);
//!
//!     let mut attempt = 1;
//!     let corrected = loop {
//!         match client.correct(&config.llm.prompt, "teh cat", attempt).await {
//!             Ok(text) => break Some(text),
//!             Err(err) => match client.retry_delay(attempt, &err) {
//!                 Some(delay) => tokio::time::sleep(delay).await,
//!                 None => break None,
//!             },
//!         }
//!         attempt += 1;
//!     };
//!     println!("{corrected:?}");
//! }
//! ```

pub mod client;
pub mod corrector;
pub mod prompt;
pub mod retry;
#[cfg(test)]
pub mod scripted;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{AttemptError, CorrectionClient};
pub use corrector::{parse_retry_after, ApiCorrector, CorrectionService, LlmError};
pub use prompt::{ChatRequest, ChatResponse};
pub use retry::RetryPolicy;
