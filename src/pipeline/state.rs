//! Pipeline phase machine and the shared, versioned phase cell.
//!
//! [`PipelinePhase`] is the single source of truth for "what is the
//! correction pipeline doing right now".  It lives inside a [`PhaseCell`],
//! a `tokio::sync::watch` channel whose value is a [`PhaseSnapshot`]
//! tagged with the job epoch.  The hotkey side reads it (to accept or drop a
//! trigger), the worker advances it, and every accepted change is forwarded
//! to the overlay as a [`PhaseUpdate`].
//!
//! The cell never holds a lock across a phase: each update is a short
//! closure run under the watch channel's internal lock.  The overlay copy is
//! queued inside that same closure, so the stream order is the commit order.
//! The stream is unbounded: a job commits a handful of changes and the
//! consumer never blocks, so nothing is ever dropped on the way.

use tokio::sync::{mpsc, watch};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Failure taxonomy shared by every stage of the pipeline.
///
/// | Kind | Retryable |
/// |------|-----------|
/// | `EmptySelection` | no |
/// | `ConnectionFailure` | yes |
/// | `Timeout` | yes |
/// | `AuthFailure` | no |
/// | `RateLimited` | yes |
/// | `ServiceUnavailable` | yes |
/// | `InvalidRequest` | no |
/// | `EmptyResponse` | no |
/// | `InputSimulationFailure` | no |
/// | `Cancelled` | no |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Capture yielded no usable text.
    EmptySelection,
    /// Network unreachable or the connection was reset.
    ConnectionFailure,
    /// A request exceeded its time budget.
    Timeout,
    /// The service rejected our credentials.
    AuthFailure,
    /// The service throttled us.
    RateLimited,
    /// Transient upstream outage.
    ServiceUnavailable,
    /// The service rejected the request as malformed.
    InvalidRequest,
    /// The service answered with empty or unusable text.
    EmptyResponse,
    /// An OS-level copy, paste or clipboard operation failed.
    InputSimulationFailure,
    /// The job was cancelled.
    Cancelled,
}

impl ErrorKind {
    /// Whether a failure of this kind may be retried under backoff.
    ///
    /// ```
    /// use text_corrector::pipeline::ErrorKind;
    ///
    /// assert!(ErrorKind::RateLimited.is_retryable());
    /// assert!(!ErrorKind::AuthFailure.is_retryable());
    /// ```
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectionFailure
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::ServiceUnavailable
        )
    }

    /// Short label shown by the overlay for a failed job.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::EmptySelection => "No text selected",
            ErrorKind::ConnectionFailure => "Connection failed",
            ErrorKind::Timeout => "Timed out",
            ErrorKind::AuthFailure => "Invalid API key",
            ErrorKind::RateLimited => "Rate limited",
            ErrorKind::ServiceUnavailable => "Service unavailable",
            ErrorKind::InvalidRequest => "Request rejected",
            ErrorKind::EmptyResponse => "Empty correction",
            ErrorKind::InputSimulationFailure => "Paste failed",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PipelinePhase
// ---------------------------------------------------------------------------

/// States of the correction pipeline.
///
/// ```text
/// Idle ──trigger──▶ Capturing ──text──▶ Correcting(1) ─retry─▶ Correcting(n)
///                      │                     │
///                      └──────▶ Failed ◀─────┤
///                                 ▲          ▼
///                                 └───── Applying ──▶ Succeeded
/// Succeeded / Failed ──display timeout──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    /// Waiting for the hotkey.
    #[default]
    Idle,
    /// Copying the user's selection off the clipboard.
    Capturing,
    /// Waiting on the correction service; `attempt` starts at 1.
    Correcting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Pasting the corrected text and restoring the clipboard.
    Applying,
    /// The corrected text was pasted.
    Succeeded,
    /// The job ended without pasting.
    Failed(ErrorKind),
}

impl PipelinePhase {
    /// `true` while a job is outstanding (any phase other than `Idle`).
    pub fn is_busy(&self) -> bool {
        !matches!(self, PipelinePhase::Idle)
    }

    /// `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelinePhase::Succeeded | PipelinePhase::Failed(_))
    }

    /// Phases in which `cancel()` still has an effect.  Once `Applying`
    /// starts the paste is committed.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Capturing | PipelinePhase::Correcting { .. }
        )
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// ```
    /// use text_corrector::pipeline::{ErrorKind, PipelinePhase};
    ///
    /// let capturing = PipelinePhase::Capturing;
    /// assert!(capturing.can_advance_to(&PipelinePhase::Correcting { attempt: 1 }));
    /// assert!(capturing.can_advance_to(&PipelinePhase::Failed(ErrorKind::EmptySelection)));
    /// assert!(!capturing.can_advance_to(&PipelinePhase::Applying));
    /// ```
    pub fn can_advance_to(&self, next: &PipelinePhase) -> bool {
        use PipelinePhase::*;
        match (self, next) {
            (Idle, Capturing) => true,
            (Capturing, Correcting { attempt }) => *attempt == 1,
            (Correcting { attempt: n }, Correcting { attempt: m }) => *m == n + 1,
            (Correcting { .. }, Applying) => true,
            (Applying, Succeeded) => true,
            (Capturing | Correcting { .. } | Applying, Failed(_)) => true,
            (Succeeded | Failed(_), Idle) => true,
            _ => false,
        }
    }

    /// A short human-readable label for logs and the overlay.
    pub fn label(&self) -> String {
        match self {
            PipelinePhase::Idle => "Idle".into(),
            PipelinePhase::Capturing => "Capturing".into(),
            PipelinePhase::Correcting { attempt: 1 } => "Correcting".into(),
            PipelinePhase::Correcting { attempt } => format!("Correcting (attempt {attempt})"),
            PipelinePhase::Applying => "Applying".into(),
            PipelinePhase::Succeeded => "Done".into(),
            PipelinePhase::Failed(kind) => kind.label().into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Anchor / snapshots
// ---------------------------------------------------------------------------

/// Screen position where the job was started; the overlay stays there for
/// the whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Anchor {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// The versioned value held by [`PhaseCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseSnapshot {
    /// Job generation; bumped every time a trigger is accepted.
    pub epoch: u64,
    pub phase: PipelinePhase,
    /// `None` until the worker has queried the cursor for this job.
    pub anchor: Option<Anchor>,
}

/// One entry of the orchestrator → overlay stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseUpdate {
    pub phase: PipelinePhase,
    pub anchor: Option<Anchor>,
}

// ---------------------------------------------------------------------------
// PhaseCell
// ---------------------------------------------------------------------------

/// Atomically updated, epoch-tagged pipeline phase.
///
/// Reads are lock-free snapshots (`watch::Sender::borrow`); writes are
/// compare-and-set closures so two threads can never both leave `Idle`.
#[derive(Debug)]
pub struct PhaseCell {
    tx: watch::Sender<PhaseSnapshot>,
    overlay: Option<mpsc::UnboundedSender<PhaseUpdate>>,
}

impl PhaseCell {
    /// Create a cell in `Idle` (epoch 0).  Accepted changes are mirrored to
    /// `overlay` when given.
    pub fn new(overlay: Option<mpsc::UnboundedSender<PhaseUpdate>>) -> Self {
        let (tx, _rx) = watch::channel(PhaseSnapshot::default());
        Self { tx, overlay }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> PhaseSnapshot {
        *self.tx.borrow()
    }

    /// Current phase.
    pub fn phase(&self) -> PipelinePhase {
        self.tx.borrow().phase
    }

    /// Subscribe to every committed change.
    pub fn subscribe(&self) -> watch::Receiver<PhaseSnapshot> {
        self.tx.subscribe()
    }

    /// Leave `Idle` for `Capturing`, returning the new job epoch, or `None`
    /// when a job is already outstanding.
    pub fn try_begin(&self) -> Option<u64> {
        let mut epoch = None;
        self.commit(|s| {
            if s.phase != PipelinePhase::Idle {
                return false;
            }
            s.epoch += 1;
            s.phase = PipelinePhase::Capturing;
            s.anchor = None;
            epoch = Some(s.epoch);
            true
        });
        epoch
    }

    /// Undo a [`try_begin`](Self::try_begin) whose job could not be handed
    /// to the worker.
    pub fn abandon(&self, epoch: u64) {
        self.commit(|s| {
            if s.epoch != epoch || s.phase != PipelinePhase::Capturing {
                return false;
            }
            s.phase = PipelinePhase::Idle;
            s.anchor = None;
            true
        });
    }

    /// Move job `epoch` to `next`.  Returns `false` when the job is stale
    /// (cancelled or superseded) or the transition is not legal.
    pub fn advance(&self, epoch: u64, next: PipelinePhase) -> bool {
        self.commit(|s| {
            if s.epoch != epoch || !s.phase.can_advance_to(&next) {
                return false;
            }
            s.phase = next;
            if next == PipelinePhase::Idle {
                s.anchor = None;
            }
            true
        })
    }

    /// Record the cursor anchor of job `epoch`.
    pub fn set_anchor(&self, epoch: u64, anchor: Anchor) -> bool {
        self.commit(|s| {
            if s.epoch != epoch || !s.phase.is_busy() {
                return false;
            }
            s.anchor = Some(anchor);
            true
        })
    }

    /// Force the outstanding job into `Failed(Cancelled)`.  Returns the
    /// cancelled epoch, or `None` when there was nothing to cancel.
    pub fn cancel(&self) -> Option<u64> {
        let mut epoch = None;
        self.commit(|s| {
            if !s.phase.is_cancellable() {
                return false;
            }
            s.phase = PipelinePhase::Failed(ErrorKind::Cancelled);
            epoch = Some(s.epoch);
            true
        });
        epoch
    }

    /// Whether job `epoch` has been cancelled or superseded.
    pub fn is_stale(&self, epoch: u64) -> bool {
        let s = self.tx.borrow();
        s.epoch != epoch || s.phase == PipelinePhase::Failed(ErrorKind::Cancelled)
    }

    fn commit(&self, modify: impl FnOnce(&mut PhaseSnapshot) -> bool) -> bool {
        self.tx.send_if_modified(|s| {
            if !modify(s) {
                return false;
            }
            if let Some(overlay) = &self.overlay {
                let update = PhaseUpdate {
                    phase: s.phase,
                    anchor: s.anchor,
                };
                // Only fails once the overlay is gone.
                if overlay.send(update).is_err() {
                    log::debug!("overlay: receiver closed ({})", update.phase.label());
                }
            }
            true
        })
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
