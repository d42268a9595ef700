//! Selection capture and text injection through the system clipboard.
//!
//! # Overview
//!
//! The pipeline never types text key by key.  It drives the clipboard:
//!
//! 1. **Snapshot** the user's clipboard content.
//! 2. **Copy** the selection (simulated Ctrl+C / ⌘C) and poll until it lands.
//! 3. **Paste** the corrected text (clipboard write + Ctrl+V / ⌘V).
//! 4. **Restore** the snapshot once the paste has settled.
//!
//! The OS primitives sit behind the [`InputSimulator`] trait so the
//! [`ClipboardGuard`] discipline can be exercised without a desktop session.

pub mod clipboard;
#[cfg(test)]
pub mod fake;
pub mod guard;
pub mod keyboard;

pub use clipboard::{clear_clipboard, read_clipboard, write_clipboard};
pub use guard::{CaptureTiming, ClipboardGuard, ClipboardSnapshot};
pub use keyboard::{cursor_position, simulate_copy, simulate_paste};

use std::time::Duration;

use thiserror::Error;

use crate::pipeline::ErrorKind;

// ---------------------------------------------------------------------------
// InjectError
// ---------------------------------------------------------------------------

/// All errors that can surface while capturing or injecting text.
#[derive(Debug, Error)]
pub enum InjectError {
    /// Could not open or read the system clipboard.
    #[error("cannot access clipboard: {0}")]
    ClipboardAccess(String),

    /// Could not write text to the system clipboard.
    #[error("cannot set clipboard text: {0}")]
    ClipboardSet(String),

    /// Could not simulate a key press/release event.
    #[error("cannot simulate key press: {0}")]
    KeySimulation(String),

    /// The pointer position could not be queried.
    #[error("cannot query cursor position: {0}")]
    CursorQuery(String),

    /// The copy never produced usable text.
    #[error("no text was selected")]
    EmptySelection,
}

impl InjectError {
    /// Map onto the pipeline failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InjectError::EmptySelection => ErrorKind::EmptySelection,
            _ => ErrorKind::InputSimulationFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// InputSimulator
// ---------------------------------------------------------------------------

/// OS input primitives used by the pipeline.
///
/// All calls are synchronous and may block briefly; the orchestrator runs
/// them on `tokio::task::spawn_blocking`.
pub trait InputSimulator: Send + Sync {
    /// Send the "copy selection" shortcut to the focused window.
    fn copy_selection(&self) -> Result<(), InjectError>;

    /// Put `text` on the clipboard and send the "paste" shortcut.
    fn paste(&self, text: &str) -> Result<(), InjectError>;

    /// Current clipboard text; `None` when empty or non-text.
    fn read_clipboard(&self) -> Result<Option<String>, InjectError>;

    /// Replace the clipboard with `text`.
    fn write_clipboard(&self, text: &str) -> Result<(), InjectError>;

    /// Leave the clipboard empty.
    fn clear_clipboard(&self) -> Result<(), InjectError>;

    /// Pointer position in screen coordinates.
    fn cursor_position(&self) -> Result<(i32, i32), InjectError>;
}

// ---------------------------------------------------------------------------
// SystemInput
// ---------------------------------------------------------------------------

/// [`InputSimulator`] backed by `arboard` and `enigo`.
#[derive(Debug, Clone)]
pub struct SystemInput {
    /// Pause between writing the clipboard and sending the paste shortcut,
    /// so clipboard managers flush before the target app reads.
    pub paste_delay: Duration,
}

impl Default for SystemInput {
    fn default() -> Self {
        Self {
            paste_delay: Duration::from_millis(50),
        }
    }
}

impl SystemInput {
    pub fn new(paste_delay: Duration) -> Self {
        Self { paste_delay }
    }
}

impl InputSimulator for SystemInput {
    fn copy_selection(&self) -> Result<(), InjectError> {
        simulate_copy()
    }

    fn paste(&self, text: &str) -> Result<(), InjectError> {
        write_clipboard(text)?;
        std::thread::sleep(self.paste_delay);
        simulate_paste()
    }

    fn read_clipboard(&self) -> Result<Option<String>, InjectError> {
        read_clipboard()
    }

    fn write_clipboard(&self, text: &str) -> Result<(), InjectError> {
        write_clipboard(text)
    }

    fn clear_clipboard(&self) -> Result<(), InjectError> {
        clear_clipboard()
    }

    fn cursor_position(&self) -> Result<(i32, i32), InjectError> {
        cursor_position()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
