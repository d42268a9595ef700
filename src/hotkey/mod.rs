//! Global hotkeys for starting and cancelling a correction, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread**; it cannot be
//! used inside a tokio task.
//!
//! ```text
//!  rdev thread                         tokio runtime
//!  ───────────                         ─────────────
//!  KeyPress / KeyRelease
//!      │
//!      ▼
//!  ComboTracker ── HotkeyEvent ──▶ mpsc ──▶ dispatch() ──▶ OrchestratorHandle
//!  (held modifiers,  try_send,          │                   trigger() / cancel()
//!   one fire/press)  never blocks       └──────────────────▶ PanelSwitch::toggle()
//! ```
//!
//! Combos are written `modifier+...+key`, e.g. `ctrl+alt+c`.  Matching is
//! exact on modifiers: `ctrl+alt+c` does not fire while Shift is also held.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use text_corrector::hotkey::{HotkeyCombo, HotkeyEvent, HotkeyListener};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let bindings = vec![
//!     (HotkeyCombo::parse("ctrl+alt+c").unwrap(), HotkeyEvent::CorrectSelection),
//!     (HotkeyCombo::parse("ctrl+alt+x").unwrap(), HotkeyEvent::CancelCorrection),
//! ];
//! let _listener = HotkeyListener::start(bindings, tx).unwrap();
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod dispatch;
pub mod listener;

use std::fmt;

use thiserror::Error;

pub use dispatch::dispatch;
pub use listener::{ComboTracker, HotkeyListener};

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events emitted by the hotkey listener thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// Correct the current selection.
    CorrectSelection,
    /// Abandon the outstanding correction.
    CancelCorrection,
    /// Show or hide the control panel.
    TogglePanel,
}

// ---------------------------------------------------------------------------
// HotkeyError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("empty hotkey combo")]
    Empty,

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("hotkey combo '{0}' has no non-modifier key")]
    MissingKey(String),

    #[error("failed to spawn hotkey listener thread: {0}")]
    Spawn(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// The set of modifier keys a combo requires (or that are currently held).
///
/// Left and right variants are not distinguished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Set the flag named by `token`.  Returns `false` when `token` is not a
    /// modifier name.
    fn insert(&mut self, token: &str) -> bool {
        match token {
            "ctrl" | "control" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            "meta" | "super" | "win" | "cmd" | "command" => self.meta = true,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.ctrl, "ctrl"),
            (self.alt, "alt"),
            (self.shift, "shift"),
            (self.meta, "meta"),
        ];
        let mut first = true;
        for (held, name) in names {
            if held {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HotkeyCombo
// ---------------------------------------------------------------------------

/// A key plus the exact set of modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotkeyCombo {
    pub modifiers: Modifiers,
    pub key: rdev::Key,
}

impl HotkeyCombo {
    /// Parse `modifier+...+key`, case-insensitively, ignoring whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_corrector::hotkey::HotkeyCombo;
    ///
    /// let combo = HotkeyCombo::parse("Ctrl + Alt + C").unwrap();
    /// assert!(combo.modifiers.ctrl && combo.modifiers.alt);
    /// assert_eq!(combo.key, rdev::Key::KeyC);
    ///
    /// assert!(HotkeyCombo::parse("ctrl+alt").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, HotkeyError> {
        let tokens: Vec<String> = text
            .split('+')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let Some((key_token, modifier_tokens)) = tokens.split_last() else {
            return Err(HotkeyError::Empty);
        };

        let mut modifiers = Modifiers::default();
        for token in modifier_tokens {
            if !modifiers.insert(token) {
                return Err(HotkeyError::UnknownKey(token.clone()));
            }
        }

        if Modifiers::default().insert(key_token) {
            return Err(HotkeyError::MissingKey(text.to_string()));
        }
        let key =
            parse_key(key_token).ok_or_else(|| HotkeyError::UnknownKey(key_token.clone()))?;

        Ok(Self { modifiers, key })
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a single (non-modifier) key name into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, ASCII letters and digits, all
/// case-insensitive.  Returns `None` for unrecognised names.
///
/// # Examples
///
/// ```
/// use text_corrector::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"),      Some(rdev::Key::F9));
/// assert_eq!(parse_key("escape"),  Some(rdev::Key::Escape));
/// assert_eq!(parse_key("C"),       Some(rdev::Key::KeyC));
/// assert_eq!(parse_key("xyz"),     None);
/// ```
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let key = match key_str.to_ascii_lowercase().as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,

        "escape" | "esc" => Key::Escape,
        "space" => Key::Space,
        "return" | "enter" => Key::Return,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "insert" | "ins" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "up" | "uparrow" => Key::UpArrow,
        "down" | "downarrow" => Key::DownArrow,
        "left" | "leftarrow" => Key::LeftArrow,
        "right" | "rightarrow" => Key::RightArrow,
        "pause" => Key::Pause,
        "printscreen" => Key::PrintScreen,

        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,

        "a" => Key::KeyA,
        "b" => Key::KeyB,
        "c" => Key::KeyC,
        "d" => Key::KeyD,
        "e" => Key::KeyE,
        "f" => Key::KeyF,
        "g" => Key::KeyG,
        "h" => Key::KeyH,
        "i" => Key::KeyI,
        "j" => Key::KeyJ,
        "k" => Key::KeyK,
        "l" => Key::KeyL,
        "m" => Key::KeyM,
        "n" => Key::KeyN,
        "o" => Key::KeyO,
        "p" => Key::KeyP,
        "q" => Key::KeyQ,
        "r" => Key::KeyR,
        "s" => Key::KeyS,
        "t" => Key::KeyT,
        "u" => Key::KeyU,
        "v" => Key::KeyV,
        "w" => Key::KeyW,
        "x" => Key::KeyX,
        "y" => Key::KeyY,
        "z" => Key::KeyZ,

        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_function_and_named_keys() {
        assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
        assert_eq!(parse_key("f12"), Some(rdev::Key::F12));
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key("SPACE"), Some(rdev::Key::Space));
        assert_eq!(parse_key("7"), Some(rdev::Key::Num7));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn combo_default_bindings() {
        let correct = HotkeyCombo::parse("ctrl+alt+c").unwrap();
        assert_eq!(
            correct.modifiers,
            Modifiers {
                ctrl: true,
                alt: true,
                ..Modifiers::default()
            }
        );
        assert_eq!(correct.key, rdev::Key::KeyC);

        let cancel = HotkeyCombo::parse("ctrl+alt+x").unwrap();
        assert_eq!(cancel.key, rdev::Key::KeyX);
    }

    #[test]
    fn combo_is_case_and_space_insensitive() {
        let a = HotkeyCombo::parse(" Ctrl + SHIFT + f ").unwrap();
        let b = HotkeyCombo::parse("control+shift+F").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.modifiers.to_string(), "ctrl+shift");
    }

    #[test]
    fn bare_key_is_allowed() {
        let combo = HotkeyCombo::parse("F9").unwrap();
        assert_eq!(combo.modifiers, Modifiers::default());
        assert_eq!(combo.key, rdev::Key::F9);
    }

    #[test]
    fn combo_errors() {
        assert!(matches!(HotkeyCombo::parse(""), Err(HotkeyError::Empty)));
        assert!(matches!(HotkeyCombo::parse(" + "), Err(HotkeyError::Empty)));
        assert!(matches!(
            HotkeyCombo::parse("ctrl+alt"),
            Err(HotkeyError::MissingKey(_))
        ));
        assert!(matches!(
            HotkeyCombo::parse("ctrl+banana"),
            Err(HotkeyError::UnknownKey(k)) if k == "banana"
        ));
        assert!(matches!(
            HotkeyCombo::parse("hyper+c"),
            Err(HotkeyError::UnknownKey(k)) if k == "hyper"
        ));
    }
}
