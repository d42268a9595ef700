//! Keyboard and pointer helpers backed by the `enigo` crate.
//!
//! | Action | macOS | Windows / Linux |
//! |--------|-------|-----------------|
//! | copy   | ⌘C    | Ctrl+C          |
//! | paste  | ⌘V    | Ctrl+V          |
//!
//! A new [`Enigo`] instance is created for each call because `Enigo` is not
//! `Send` and the handle is cheap to construct.

use enigo::{Direction, Enigo, Key, Keyboard, Mouse, Settings};

use super::InjectError;

#[cfg(target_os = "macos")]
const SHORTCUT_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const SHORTCUT_MODIFIER: Key = Key::Control;

/// Send the system copy shortcut to the focused window.
///
/// # Errors
///
/// Returns [`InjectError::KeySimulation`] if the enigo backend cannot be
/// initialised or a key event is not delivered.
pub fn simulate_copy() -> Result<(), InjectError> {
    send_shortcut('c')
}

/// Send the system paste shortcut to the focused window.
///
/// # Errors
///
/// Same as [`simulate_copy`].
pub fn simulate_paste() -> Result<(), InjectError> {
    send_shortcut('v')
}

/// Current pointer position in screen coordinates.
///
/// # Errors
///
/// Returns [`InjectError::CursorQuery`] when the backend cannot report the
/// pointer location.
pub fn cursor_position() -> Result<(i32, i32), InjectError> {
    let enigo = new_enigo()?;
    enigo
        .location()
        .map_err(|e| InjectError::CursorQuery(e.to_string()))
}

fn send_shortcut(letter: char) -> Result<(), InjectError> {
    let mut enigo = new_enigo()?;

    enigo
        .key(SHORTCUT_MODIFIER, Direction::Press)
        .map_err(|e| InjectError::KeySimulation(e.to_string()))?;
    let clicked = enigo
        .key(Key::Unicode(letter), Direction::Click)
        .map_err(|e| InjectError::KeySimulation(e.to_string()));
    // Always release the modifier, even when the click failed.
    let released = enigo
        .key(SHORTCUT_MODIFIER, Direction::Release)
        .map_err(|e| InjectError::KeySimulation(e.to_string()));

    clicked.and(released)
}

fn new_enigo() -> Result<Enigo, InjectError> {
    Enigo::new(&Settings::default()).map_err(|e| InjectError::KeySimulation(e.to_string()))
}
