//! Per-job values owned by the orchestrator.

use std::time::Duration;

use tokio::time::Instant;

use super::state::{Anchor, ErrorKind};

/// One run of the pipeline, from accepted trigger back to `Idle`.
///
/// Lives only inside the worker; dropped when the job finishes.
#[derive(Debug, Clone)]
pub struct CorrectionJob {
    pub epoch: u64,
    pub original_text: String,
    pub corrected_text: Option<String>,
    pub started_at: Instant,
    pub attempt_count: u32,
    pub cursor_anchor: Anchor,
}

impl CorrectionJob {
    pub fn new(epoch: u64, cursor_anchor: Anchor) -> Self {
        Self {
            epoch,
            original_text: String::new(),
            corrected_text: None,
            started_at: Instant::now(),
            attempt_count: 0,
            cursor_anchor,
        }
    }

    /// Consume the job into its report.
    pub fn finish(self, result: Result<(), ErrorKind>) -> JobOutcome {
        JobOutcome {
            epoch: self.epoch,
            original: self.original_text,
            result: result.and_then(|()| self.corrected_text.ok_or(ErrorKind::EmptyResponse)),
            attempts: self.attempt_count,
            elapsed: self.started_at.elapsed(),
        }
    }
}

/// What became of a job, reported once it reaches a terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub epoch: u64,
    /// The captured selection; empty when capture failed.
    pub original: String,
    /// The pasted text, or why nothing was pasted.
    pub result: Result<String, ErrorKind>,
    /// Correction attempts made (0 when capture failed).
    pub attempts: u32,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.result.as_ref().err().copied()
    }
}
