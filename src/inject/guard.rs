//! Snapshot / restore discipline around clipboard mutation.
//!
//! [`ClipboardGuard::capture_selection`] snapshots whatever the user had on
//! the clipboard before overwriting it; [`ClipboardGuard::apply_and_restore`]
//! pastes the corrected text and puts the snapshot back.  Failure paths call
//! [`ClipboardGuard::restore`], so the user's clipboard survives every
//! outcome.
//!
//! Copy-then-read across process boundaries is not instantaneous, so the
//! capture writes a unique sentinel first and polls until the clipboard
//! holds something else, within a bounded budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::{InjectError, InputSimulator};
use crate::config::ClipboardConfig;

// ---------------------------------------------------------------------------
// CaptureTiming
// ---------------------------------------------------------------------------

/// Delays and budgets used by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Total time allowed for the copy to land.
    pub capture_timeout: Duration,
    /// Gap between clipboard reads while polling.
    pub poll_interval: Duration,
    /// How many times the copy shortcut is sent within `capture_timeout`.
    pub copy_attempts: u32,
    /// Pause before copying so the user can release the hotkey modifiers.
    pub pre_capture_delay: Duration,
    /// Pause after pasting before the snapshot overwrites the clipboard.
    pub settle_delay: Duration,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self::from(&ClipboardConfig::default())
    }
}

impl From<&ClipboardConfig> for CaptureTiming {
    fn from(config: &ClipboardConfig) -> Self {
        Self {
            capture_timeout: Duration::from_millis(config.capture_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            copy_attempts: config.copy_attempts.max(1),
            pre_capture_delay: Duration::from_millis(config.pre_capture_delay_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// ClipboardSnapshot
// ---------------------------------------------------------------------------

/// Clipboard content taken right before the guard first overwrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    /// `None` when the clipboard was empty or held non-text data; restoring
    /// such a snapshot clears the clipboard.
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// ClipboardGuard
// ---------------------------------------------------------------------------

/// Wraps an [`InputSimulator`] with snapshot/restore semantics.
///
/// Holds at most one snapshot at a time; the orchestrator runs one job at a
/// time so the slot is never contended.
pub struct ClipboardGuard {
    input: Arc<dyn InputSimulator>,
    timing: CaptureTiming,
    snapshot: Mutex<Option<ClipboardSnapshot>>,
}

impl ClipboardGuard {
    pub fn new(input: Arc<dyn InputSimulator>, timing: CaptureTiming) -> Self {
        Self {
            input,
            timing,
            snapshot: Mutex::new(None),
        }
    }

    /// The wrapped input primitives.
    pub fn input(&self) -> &Arc<dyn InputSimulator> {
        &self.input
    }

    /// Snapshot the clipboard, copy the selection and return it.
    ///
    /// On failure the snapshot has already been restored.
    ///
    /// # Errors
    ///
    /// [`InjectError::EmptySelection`] when nothing (or only whitespace)
    /// landed within the budget; any OS error from the input primitives.
    pub fn capture_selection(&self) -> Result<String, InjectError> {
        thread::sleep(self.timing.pre_capture_delay);

        let previous = self.input.read_clipboard()?;
        self.store(ClipboardSnapshot { content: previous });

        let sentinel = next_sentinel();
        let captured = self
            .input
            .write_clipboard(&sentinel)
            .and_then(|()| self.poll_copy(&sentinel));

        match captured {
            Ok(text) => {
                log::debug!("clipboard: captured {} chars", text.chars().count());
                Ok(text)
            }
            Err(e) => {
                if let Err(restore_err) = self.restore() {
                    log::warn!("clipboard: restore after failed capture: {restore_err}");
                }
                Err(e)
            }
        }
    }

    /// Paste `corrected` over the selection, wait for it to settle, then put
    /// the pre-capture snapshot back.
    ///
    /// The snapshot is restored even when the paste fails.
    ///
    /// # Errors
    ///
    /// The first OS error from paste or restore.
    pub fn apply_and_restore(&self, corrected: &str) -> Result<(), InjectError> {
        let pasted = self.input.paste(corrected);
        if pasted.is_ok() {
            // Let the target app read the clipboard before we overwrite it.
            thread::sleep(self.timing.settle_delay);
        }
        let restored = self.restore();
        pasted.and(restored)
    }

    /// Put back the held snapshot, if any.  Idempotent.
    ///
    /// An empty snapshot clears the clipboard, so neither the sentinel nor
    /// the pasted text outlives the job.
    ///
    /// # Errors
    ///
    /// Propagates clipboard write failures.
    pub fn restore(&self) -> Result<(), InjectError> {
        let snapshot = match self.snapshot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match snapshot {
            Some(ClipboardSnapshot {
                content: Some(text),
            }) => {
                self.input.write_clipboard(&text)?;
                log::debug!("clipboard: snapshot restored");
            }
            Some(ClipboardSnapshot { content: None }) => {
                self.input.clear_clipboard()?;
                log::debug!("clipboard: emptied, nothing to restore");
            }
            None => {}
        }
        Ok(())
    }

    /// Whether a snapshot is waiting to be restored.
    pub fn holds_snapshot(&self) -> bool {
        self.snapshot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn store(&self, snapshot: ClipboardSnapshot) {
        match self.snapshot.lock() {
            Ok(mut slot) => *slot = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    /// Send the copy shortcut up to `copy_attempts` times, splitting the
    /// timeout evenly, until the clipboard stops holding `sentinel`.
    fn poll_copy(&self, sentinel: &str) -> Result<String, InjectError> {
        let attempts = self.timing.copy_attempts.max(1);
        let slice = self.timing.capture_timeout / attempts;

        for attempt in 1..=attempts {
            self.input.copy_selection()?;
            let deadline = Instant::now() + slice;

            loop {
                if let Some(text) = self.input.read_clipboard()? {
                    if text != sentinel {
                        return if text.trim().is_empty() {
                            Err(InjectError::EmptySelection)
                        } else {
                            Ok(text)
                        };
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                thread::sleep(self.timing.poll_interval);
            }
            log::debug!("clipboard: copy attempt {attempt}/{attempts} did not land");
        }

        Err(InjectError::EmptySelection)
    }
}

/// A clipboard value no user selection will ever equal.
fn next_sentinel() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("\u{2063}text-corrector:{}:{n}\u{2063}", std::process::id())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::fake::FakeInput;

    fn fast_timing() -> CaptureTiming {
        CaptureTiming {
            capture_timeout: Duration::from_millis(30),
            poll_interval: Duration::from_millis(2),
            copy_attempts: 2,
            pre_capture_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }

    fn guard(input: &Arc<FakeInput>) -> ClipboardGuard {
        ClipboardGuard::new(Arc::clone(input) as Arc<dyn InputSimulator>, fast_timing())
    }

    #[test]
    fn capture_returns_selection_and_holds_snapshot() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("hello wrld")));
        let guard = guard(&input);

        assert_eq!(guard.capture_selection().unwrap(), "hello wrld");
        assert!(guard.holds_snapshot());
    }

    #[test]
    fn apply_pastes_then_restores_snapshot() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("hello wrld")));
        let guard = guard(&input);

        guard.capture_selection().unwrap();
        guard.apply_and_restore("hello world").unwrap();

        let st = input.state();
        assert_eq!(st.pasted, vec!["hello world".to_string()]);
        assert_eq!(st.clipboard.as_deref(), Some("X"));
        assert!(!guard.holds_snapshot());
    }

    #[test]
    fn selection_equal_to_old_clipboard_is_still_captured() {
        let input = Arc::new(FakeInput::new(Some("same"), Some("same")));
        let guard = guard(&input);
        assert_eq!(guard.capture_selection().unwrap(), "same");
    }

    #[test]
    fn nothing_selected_times_out_and_restores() {
        let input = Arc::new(FakeInput::new(Some("X"), None));
        let guard = guard(&input);

        let err = guard.capture_selection().unwrap_err();
        assert!(matches!(err, InjectError::EmptySelection));

        let st = input.state();
        assert_eq!(st.clipboard.as_deref(), Some("X"));
        // Copy was re-sent once per attempt.
        assert_eq!(st.copies, 2);
        assert!(!guard.holds_snapshot());
    }

    #[test]
    fn whitespace_selection_is_empty() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("  \n\t")));
        let guard = guard(&input);

        assert!(matches!(
            guard.capture_selection(),
            Err(InjectError::EmptySelection)
        ));
        assert_eq!(input.state().clipboard.as_deref(), Some("X"));
    }

    #[test]
    fn copy_failure_restores_and_reports_os_error() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("text")).failing_copy());
        let guard = guard(&input);

        let err = guard.capture_selection().unwrap_err();
        assert!(matches!(err, InjectError::KeySimulation(_)));
        assert_eq!(input.state().clipboard.as_deref(), Some("X"));
    }

    #[test]
    fn paste_failure_still_restores() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("text")).failing_paste());
        let guard = guard(&input);

        guard.capture_selection().unwrap();
        let err = guard.apply_and_restore("fixed").unwrap_err();
        assert!(matches!(err, InjectError::KeySimulation(_)));
        assert_eq!(input.state().clipboard.as_deref(), Some("X"));
    }

    #[test]
    fn empty_snapshot_clears_clipboard_after_paste() {
        let input = Arc::new(FakeInput::new(None, Some("text")));
        let guard = guard(&input);

        guard.capture_selection().unwrap();
        guard.apply_and_restore("fixed").unwrap();

        let st = input.state();
        assert_eq!(st.pasted, vec!["fixed".to_string()]);
        assert_eq!(st.clipboard, None);
    }

    #[test]
    fn failed_capture_on_empty_clipboard_leaves_it_empty() {
        let input = Arc::new(FakeInput::new(None, None));
        let guard = guard(&input);

        let err = guard.capture_selection().unwrap_err();
        assert!(matches!(err, InjectError::EmptySelection));
        // The sentinel must not survive the failed capture.
        assert_eq!(input.state().clipboard, None);
        assert!(!guard.holds_snapshot());
    }

    #[test]
    fn restore_after_capture_on_empty_clipboard_clears_selection() {
        let input = Arc::new(FakeInput::new(None, Some("text")));
        let guard = guard(&input);

        guard.capture_selection().unwrap();
        assert_eq!(input.state().clipboard.as_deref(), Some("text"));
        guard.restore().unwrap();
        assert_eq!(input.state().clipboard, None);
    }

    #[test]
    fn restore_is_idempotent() {
        let input = Arc::new(FakeInput::new(Some("X"), Some("text")));
        let guard = guard(&input);

        guard.capture_selection().unwrap();
        guard.restore().unwrap();
        input.write_clipboard("user copied something new").unwrap();
        guard.restore().unwrap();
        assert_eq!(
            input.state().clipboard.as_deref(),
            Some("user copied something new")
        );
    }

    #[test]
    fn sentinels_are_unique() {
        assert_ne!(next_sentinel(), next_sentinel());
    }
}
