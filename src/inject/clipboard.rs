//! Clipboard read / write helpers backed by the `arboard` crate.
//!
//! Every function creates a short-lived [`arboard::Clipboard`] handle
//! rather than sharing one across calls, because `arboard::Clipboard` is not
//! `Send` on all platforms and the clipboard handle is cheap to create.

use arboard::Clipboard;

use super::InjectError;

/// Read the current clipboard plain-text content.
///
/// Returns `Ok(None)` when the clipboard is empty or holds non-text data
/// (e.g. an image).
///
/// # Errors
///
/// Returns [`InjectError::ClipboardAccess`] if the OS clipboard cannot be
/// opened.
pub fn read_clipboard() -> Result<Option<String>, InjectError> {
    let mut clipboard = open_clipboard()?;
    // `get_text` returns Err if empty or non-text: treat both as None
    Ok(clipboard.get_text().ok())
}

/// Write `text` into the system clipboard, replacing whatever was there.
///
/// # Errors
///
/// Returns [`InjectError::ClipboardAccess`] if the clipboard cannot be opened,
/// or [`InjectError::ClipboardSet`] if writing fails.
pub fn write_clipboard(text: &str) -> Result<(), InjectError> {
    let mut clipboard = open_clipboard()?;
    clipboard
        .set_text(text)
        .map_err(|e| InjectError::ClipboardSet(e.to_string()))
}

/// Empty the system clipboard.
///
/// # Errors
///
/// Returns [`InjectError::ClipboardAccess`] if the clipboard cannot be opened,
/// or [`InjectError::ClipboardSet`] if clearing fails.
pub fn clear_clipboard() -> Result<(), InjectError> {
    let mut clipboard = open_clipboard()?;
    clipboard
        .clear()
        .map_err(|e| InjectError::ClipboardSet(e.to_string()))
}

fn open_clipboard() -> Result<Clipboard, InjectError> {
    Clipboard::new().map_err(|e| InjectError::ClipboardAccess(e.to_string()))
}
