//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`HotkeyListener`] owns that thread and a stop flag; dropping it sets the
//! flag so the callback silently ignores further events.
//!
//! Combo recognition lives in [`ComboTracker`], a plain state machine fed
//! with `rdev::EventType`s, so it can be tested without an OS hook.
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has **no graceful shutdown API**.  Setting the stop flag
//! prevents events from being forwarded, but the OS thread itself will remain
//! blocked in the rdev event loop until the process exits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rdev::{EventType, Key};
use tokio::sync::mpsc;

use super::{HotkeyCombo, HotkeyError, HotkeyEvent, Modifiers};

// ---------------------------------------------------------------------------
// ComboTracker
// ---------------------------------------------------------------------------

/// Bit per side, so releasing Left Ctrl while Right Ctrl is down keeps Ctrl
/// held.
#[derive(Debug, Default, Clone, Copy)]
struct HeldModifiers {
    ctrl: u8,
    alt: u8,
    shift: u8,
    meta: u8,
}

impl HeldModifiers {
    /// Update for `key`; returns `false` when `key` is not a modifier.
    fn apply(&mut self, key: Key, down: bool) -> bool {
        let (slot, bit) = match key {
            Key::ControlLeft => (&mut self.ctrl, 1),
            Key::ControlRight => (&mut self.ctrl, 2),
            Key::Alt => (&mut self.alt, 1),
            Key::AltGr => (&mut self.alt, 2),
            Key::ShiftLeft => (&mut self.shift, 1),
            Key::ShiftRight => (&mut self.shift, 2),
            Key::MetaLeft => (&mut self.meta, 1),
            Key::MetaRight => (&mut self.meta, 2),
            _ => return false,
        };
        if down {
            *slot |= bit;
        } else {
            *slot &= !bit;
        }
        true
    }

    fn current(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl != 0,
            alt: self.alt != 0,
            shift: self.shift != 0,
            meta: self.meta != 0,
        }
    }
}

struct Binding {
    combo: HotkeyCombo,
    event: HotkeyEvent,
    /// Set once fired; cleared when the combo key is released.
    latched: bool,
}

/// Turns raw key events into [`HotkeyEvent`]s.
///
/// Each binding fires once per physical press: OS key-repeat while the combo
/// is held is swallowed until the key is released.
pub struct ComboTracker {
    held: HeldModifiers,
    bindings: Vec<Binding>,
}

impl ComboTracker {
    pub fn new(bindings: impl IntoIterator<Item = (HotkeyCombo, HotkeyEvent)>) -> Self {
        Self {
            held: HeldModifiers::default(),
            bindings: bindings
                .into_iter()
                .map(|(combo, event)| Binding {
                    combo,
                    event,
                    latched: false,
                })
                .collect(),
        }
    }

    /// Feed one key event.  Returns the hotkey it completes, if any.
    pub fn handle(&mut self, event: &EventType) -> Option<HotkeyEvent> {
        match *event {
            EventType::KeyPress(key) => {
                if self.held.apply(key, true) {
                    return None;
                }
                let held = self.held.current();
                let binding = self
                    .bindings
                    .iter_mut()
                    .find(|b| b.combo.key == key && b.combo.modifiers == held)?;
                if binding.latched {
                    return None;
                }
                binding.latched = true;
                Some(binding.event)
            }
            EventType::KeyRelease(key) => {
                if !self.held.apply(key, false) {
                    for binding in self.bindings.iter_mut().filter(|b| b.combo.key == key) {
                        binding.latched = false;
                    }
                }
                None
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyListener
// ---------------------------------------------------------------------------

/// Handle to a running hotkey listener thread.
///
/// Construct one with [`HotkeyListener::start`].  Drop it to stop forwarding
/// events.
pub struct HotkeyListener {
    /// Shared stop flag, set `true` on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Never joined: `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn a dedicated OS thread that listens for global key events and
    /// forwards matched [`HotkeyEvent`]s on `tx`.
    ///
    /// Events are sent with `try_send`: the OS input hook must not stall, so
    /// a full channel drops the event.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::Spawn`] if the OS refuses to create the thread.
    pub fn start(
        bindings: Vec<(HotkeyCombo, HotkeyEvent)>,
        tx: mpsc::Sender<HotkeyEvent>,
    ) -> Result<Self, HotkeyError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let mut tracker = ComboTracker::new(bindings);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(hotkey) = tracker.handle(&event.event_type) {
                        log::debug!("hotkey-listener: {hotkey:?}");
                        if let Err(e) = tx.try_send(hotkey) {
                            log::warn!("hotkey-listener: dropped {hotkey:?}: {e}");
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
