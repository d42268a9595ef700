//! The indicator itself: a small borderless eframe window.
//!
//! # Appearance
//!
//! | Phase | Visual |
//! |-------|--------|
//! | `Capturing` | Spinner + "Copying…": blue |
//! | `Correcting(1)` | Spinner + "Correcting…": blue |
//! | `Correcting(n)` | Spinner + "Correcting (attempt n)…": amber |
//! | `Applying` | Spinner + "Pasting…": blue |
//! | `Succeeded` | "Done": green |
//! | `Failed(kind)` | Short failure label: orange |
//!
//! The OS window is never hidden.  It is transparent and ignores the mouse,
//! and while the indicator is `Hidden` it paints nothing, so eframe keeps
//! calling `update` and the next state is always picked up.  It is moved
//! next to the job anchor whenever the indicator is shown.

use std::time::Duration;

use eframe::egui;
use tokio::sync::watch;

use super::{ControlPanel, IndicatorState, RepaintSlot};
use crate::config::OverlayConfig;
use crate::pipeline::{Anchor, ErrorKind, PipelinePhase};

const WINDOW_SIZE: [f32; 2] = [240.0, 40.0];

/// Idle poll interval while nothing is on screen.
const IDLE_REPAINT: Duration = Duration::from_millis(250);

const BLUE: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const AMBER: egui::Color32 = egui::Color32::from_rgb(240, 190, 60);
const GREEN: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const ORANGE: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);
const GRAY: egui::Color32 = egui::Color32::from_rgb(160, 160, 160);

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

/// Viewport for the indicator: no decorations, transparent, on top, click
/// through.
pub fn native_options() -> eframe::NativeOptions {
    let vp = egui::ViewportBuilder::default()
        .with_decorations(false)
        .with_transparent(true)
        .with_always_on_top()
        .with_taskbar(false)
        .with_mouse_passthrough(true)
        .with_inner_size(WINDOW_SIZE)
        .with_resizable(false);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// OverlayWindow
// ---------------------------------------------------------------------------

/// eframe application rendering the latest [`IndicatorState`] and, when
/// configured, the [`ControlPanel`].
pub struct OverlayWindow {
    indicator: Option<watch::Receiver<IndicatorState>>,
    panel: Option<ControlPanel>,
    /// State drawn on the previous frame.
    drawn: IndicatorState,
    offset: egui::Vec2,
    spinner_phase: f32,
}

impl OverlayWindow {
    /// Create the window and publish its context into `repaint` so senders
    /// on other threads can wake it.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        indicator: Option<watch::Receiver<IndicatorState>>,
        panel: Option<ControlPanel>,
        repaint: &RepaintSlot,
        config: &OverlayConfig,
    ) -> Self {
        if repaint.set(cc.egui_ctx.clone()).is_err() {
            log::debug!("overlay: repaint context already set");
        }
        Self {
            indicator,
            panel,
            drawn: IndicatorState::Hidden,
            offset: egui::vec2(config.offset.0 as f32, config.offset.1 as f32),
            spinner_phase: 0.0,
        }
    }

    /// Take the latest indicator state and move the window if it was just
    /// shown or re-anchored.
    fn sync_indicator(&mut self, ctx: &egui::Context) -> IndicatorState {
        let Some(rx) = &mut self.indicator else {
            return IndicatorState::Hidden;
        };
        let next = *rx.borrow_and_update();
        if let Some(pos) = reposition(self.drawn, next, self.offset) {
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
        }
        self.drawn = next;
        next
    }

    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        chars[(self.spinner_phase as usize) % chars.len()]
    }

    fn draw(&self, ui: &mut egui::Ui, phase: PipelinePhase) {
        let (text, color) = status_line(&phase);
        let text = if phase.is_terminal() {
            text
        } else {
            format!("{} {text}", self.spinner_char())
        };
        ui.centered_and_justified(|ui| {
            ui.label(egui::RichText::new(text).color(color).size(13.0));
        });
    }
}

/// Where to move the window when going from `prev` to `next`, if at all.
fn reposition(
    prev: IndicatorState,
    next: IndicatorState,
    offset: egui::Vec2,
) -> Option<egui::Pos2> {
    let IndicatorState::Shown { anchor, .. } = next else {
        return None;
    };
    match prev {
        IndicatorState::Shown { anchor: prev, .. } if prev == anchor => None,
        _ => Some(position_for(anchor, offset)),
    }
}

fn position_for(anchor: Anchor, offset: egui::Vec2) -> egui::Pos2 {
    egui::pos2(anchor.x as f32, anchor.y as f32) + offset
}

/// Text and colour for a phase.
fn status_line(phase: &PipelinePhase) -> (String, egui::Color32) {
    match phase {
        PipelinePhase::Idle => (String::new(), GRAY),
        PipelinePhase::Capturing => ("Copying…".into(), BLUE),
        PipelinePhase::Correcting { attempt: 1 } => ("Correcting…".into(), BLUE),
        PipelinePhase::Correcting { attempt } => {
            (format!("Correcting (attempt {attempt})…"), AMBER)
        }
        PipelinePhase::Applying => ("Pasting…".into(), BLUE),
        PipelinePhase::Succeeded => ("Done".into(), GREEN),
        PipelinePhase::Failed(ErrorKind::Cancelled) => ("Cancelled".into(), GRAY),
        PipelinePhase::Failed(kind) => (kind.label().into(), ORANGE),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for OverlayWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(panel) = &mut self.panel {
            panel.show(ctx);
        }

        let state = self.sync_indicator(ctx);

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        let IndicatorState::Shown {
            phase: Some(phase), ..
        } = state
        else {
            ctx.request_repaint_after(IDLE_REPAINT);
            return;
        };
        if phase.is_terminal() {
            ctx.request_repaint_after(IDLE_REPAINT);
        } else {
            // ~15 fps for the spinner
            ctx.request_repaint_after(Duration::from_millis(66));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 220))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(8));

        egui::CentralPanel::default()
            .frame(frame)
            .show(ctx, |ui| self.draw(ui, phase));
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }
}
