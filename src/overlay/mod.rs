//! Floating status indicator and the control panel.
//!
//! # Layers
//!
//! ```text
//! PhaseUpdate ─▶ OverlayController ─▶ dyn OverlayRenderer
//!  (mpsc)         phase → show/update/hide       │
//!                                                ▼
//!                                  WatchRenderer ── IndicatorState ──▶ OverlayWindow
//!                                  (watch + request_repaint)           (eframe, main thread)
//! ```
//!
//! The controller runs on the tokio runtime; the window lives on the main
//! thread where eframe insists on running.  The renderer publishes the whole
//! indicator state through a `watch` channel: the window always renders the
//! latest value, and an update it never saw cannot leave it stale.
//!
//! The [`panel`] is a second window hosted by the same eframe app.

pub mod controller;
pub mod panel;
pub mod window;

use std::sync::{Arc, OnceLock};

use eframe::egui;
use tokio::sync::watch;

use crate::pipeline::{Anchor, PipelinePhase};

pub use controller::OverlayController;
pub use panel::{ControlPanel, PanelSwitch};
pub use window::{native_options, OverlayWindow};

// ---------------------------------------------------------------------------
// OverlayRenderer
// ---------------------------------------------------------------------------

/// A passive display surface.
pub trait OverlayRenderer: Send {
    /// Make the indicator visible at `anchor`.
    fn show(&mut self, anchor: Anchor);
    /// Change what the indicator says.
    fn update(&mut self, phase: &PipelinePhase);
    fn hide(&mut self);
}

// ---------------------------------------------------------------------------
// IndicatorState / WatchRenderer
// ---------------------------------------------------------------------------

/// Everything the window needs to draw the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Hidden,
    Shown {
        anchor: Anchor,
        /// `None` between `show` and the first `update`.
        phase: Option<PipelinePhase>,
    },
}

/// Filled in by the window once eframe has created its context, so state
/// published from other threads can wake the UI loop.
pub type RepaintSlot = Arc<OnceLock<egui::Context>>;

/// [`OverlayRenderer`] that publishes [`IndicatorState`] for an
/// [`OverlayWindow`].  Never blocks; the latest state always wins.
pub struct WatchRenderer {
    tx: watch::Sender<IndicatorState>,
    repaint: RepaintSlot,
}

impl WatchRenderer {
    /// Create the renderer and the receiver the window reads from.
    pub fn new(repaint: RepaintSlot) -> (Self, watch::Receiver<IndicatorState>) {
        let (tx, rx) = watch::channel(IndicatorState::Hidden);
        (Self { tx, repaint }, rx)
    }

    pub fn state(&self) -> IndicatorState {
        *self.tx.borrow()
    }

    fn publish(&mut self, modify: impl FnOnce(&mut IndicatorState) -> bool) {
        if self.tx.send_if_modified(modify) {
            if let Some(ctx) = self.repaint.get() {
                ctx.request_repaint();
            }
        }
    }
}

impl OverlayRenderer for WatchRenderer {
    fn show(&mut self, anchor: Anchor) {
        self.publish(|s| {
            *s = IndicatorState::Shown {
                anchor,
                phase: None,
            };
            true
        });
    }

    fn update(&mut self, phase: &PipelinePhase) {
        let next = *phase;
        self.publish(|s| match s {
            IndicatorState::Shown { phase, .. } if *phase != Some(next) => {
                *phase = Some(next);
                true
            }
            _ => false,
        });
    }

    fn hide(&mut self) {
        self.publish(|s| {
            let was_shown = *s != IndicatorState::Hidden;
            *s = IndicatorState::Hidden;
            was_shown
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_publishes_latest_state() {
        let (mut renderer, rx) = WatchRenderer::new(RepaintSlot::default());
        let at = Anchor::new(10, 20);

        renderer.show(at);
        assert_eq!(*rx.borrow(), IndicatorState::Shown { anchor: at, phase: None });

        renderer.update(&PipelinePhase::Capturing);
        renderer.update(&PipelinePhase::Correcting { attempt: 1 });
        assert_eq!(
            *rx.borrow(),
            IndicatorState::Shown {
                anchor: at,
                phase: Some(PipelinePhase::Correcting { attempt: 1 }),
            }
        );

        renderer.hide();
        assert_eq!(*rx.borrow(), IndicatorState::Hidden);
    }

    #[test]
    fn unread_updates_collapse_into_the_last_one() {
        let (mut renderer, mut rx) = WatchRenderer::new(RepaintSlot::default());

        // Many jobs' worth of changes while the window is not reading.
        for i in 0..100 {
            renderer.show(Anchor::new(i, i));
            renderer.update(&PipelinePhase::Succeeded);
            renderer.hide();
        }

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), IndicatorState::Hidden);
    }

    #[test]
    fn update_before_show_is_ignored() {
        let (mut renderer, rx) = WatchRenderer::new(RepaintSlot::default());
        renderer.update(&PipelinePhase::Capturing);
        assert_eq!(*rx.borrow(), IndicatorState::Hidden);
        assert_eq!(renderer.state(), IndicatorState::Hidden);
    }

    #[test]
    fn renderer_without_window_never_blocks() {
        let (mut renderer, rx) = WatchRenderer::new(RepaintSlot::default());
        drop(rx);

        renderer.show(Anchor::new(0, 0));
        renderer.hide();
        assert_eq!(renderer.state(), IndicatorState::Hidden);
    }
}
