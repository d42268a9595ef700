//! Control panel: a small always-on-top window with a "Correct" button, the
//! last job's captured and corrected text, and a status line.
//!
//! The panel is toggled by its own hotkey through a [`PanelSwitch`] and
//! drawn as a child viewport of [`OverlayWindow`](super::OverlayWindow).
//! Clicking "Correct" closes the panel first so focus returns to the app
//! holding the selection, starts a job, and reopens the panel with the
//! outcome once the job reports back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use super::RepaintSlot;
use crate::config::AppConfig;
use crate::pipeline::{ErrorKind, JobOutcome, OrchestratorHandle};

const PANEL_SIZE: [f32; 2] = [320.0, 340.0];

const TITLE: egui::Color32 = egui::Color32::from_rgb(192, 192, 224);
const HINT: egui::Color32 = egui::Color32::from_rgb(160, 160, 192);
const INFO: egui::Color32 = egui::Color32::from_rgb(224, 224, 160);
const ERROR: egui::Color32 = egui::Color32::from_rgb(255, 144, 144);
const CORRECTED: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);

// ---------------------------------------------------------------------------
// PanelSwitch
// ---------------------------------------------------------------------------

/// Shared open/closed flag of the panel.  Cloneable; flipped by the hotkey
/// dispatcher and read by the UI thread every frame.
#[derive(Debug, Clone, Default)]
pub struct PanelSwitch {
    open: Arc<AtomicBool>,
    repaint: RepaintSlot,
}

impl PanelSwitch {
    pub fn new(repaint: RepaintSlot) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(false)),
            repaint,
        }
    }

    /// Flip the panel and return whether it is now open.
    pub fn toggle(&self) -> bool {
        let open = !self.open.fetch_xor(true, Ordering::AcqRel);
        self.wake();
        open
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
        self.wake();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn wake(&self) {
        if let Some(ctx) = self.repaint.get() {
            ctx.request_repaint();
        }
    }
}

// ---------------------------------------------------------------------------
// ControlPanel
// ---------------------------------------------------------------------------

/// Status line under the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
    Info(String),
    Error(String),
}

/// State and drawing of the control panel.
pub struct ControlPanel {
    handle: OrchestratorHandle,
    switch: PanelSwitch,
    outcomes: mpsc::Receiver<JobOutcome>,
    original: String,
    corrected: String,
    status: Option<PanelStatus>,
    /// The panel closed itself to start a job and reopens on its outcome.
    reopen_on_outcome: bool,
    summary: String,
}

impl ControlPanel {
    pub fn new(
        handle: OrchestratorHandle,
        switch: PanelSwitch,
        outcomes: mpsc::Receiver<JobOutcome>,
        config: &AppConfig,
    ) -> Self {
        Self {
            handle,
            switch,
            outcomes,
            original: String::new(),
            corrected: String::new(),
            status: None,
            reopen_on_outcome: false,
            summary: format!(
                "{} corrects · {} cancels · model {}",
                config.hotkey.correct, config.hotkey.cancel, config.llm.model
            ),
        }
    }

    pub fn status(&self) -> Option<&PanelStatus> {
        self.status.as_ref()
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn corrected(&self) -> &str {
        &self.corrected
    }

    /// The "Correct" button.  Hides the panel and starts a job; returns
    /// whether the pipeline accepted it.
    pub fn request_correction(&mut self) -> bool {
        if self.handle.current_phase().is_busy() {
            self.status = Some(PanelStatus::Info(
                "Busy: wait for the current correction".into(),
            ));
            return false;
        }

        self.switch.set_open(false);
        if self.handle.trigger() {
            log::info!("panel: correction requested");
            self.reopen_on_outcome = true;
            self.status = Some(PanelStatus::Info("Correcting…".into()));
            true
        } else {
            self.switch.set_open(true);
            self.status = Some(PanelStatus::Error("Could not start a correction".into()));
            false
        }
    }

    /// Drain finished jobs (non-blocking).
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: JobOutcome) {
        self.original = outcome.original;
        match outcome.result {
            Ok(text) => {
                self.corrected = text;
                self.status = Some(PanelStatus::Info("Corrected and pasted".into()));
            }
            Err(ErrorKind::Cancelled) => {
                self.corrected.clear();
                self.status = Some(PanelStatus::Info(ErrorKind::Cancelled.label().into()));
            }
            Err(kind) => {
                self.corrected.clear();
                self.status = Some(PanelStatus::Error(kind.label().into()));
            }
        }

        if std::mem::take(&mut self.reopen_on_outcome) {
            self.switch.set_open(true);
        }
    }

    fn button_label(&self) -> &'static str {
        if self.handle.current_phase().is_busy() {
            "Working…"
        } else {
            "Correct"
        }
    }

    /// Draw the panel viewport if it is open.  Call once per frame.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.poll();
        if !self.switch.is_open() {
            return;
        }

        let builder = egui::ViewportBuilder::default()
            .with_title("text-corrector")
            .with_inner_size(PANEL_SIZE)
            .with_always_on_top()
            .with_resizable(false);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("control-panel"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| self.draw(ui, ctx));
                if ctx.input(|i| i.viewport().close_requested()) {
                    self.switch.set_open(false);
                }
            },
        );
    }

    fn draw(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Text correction").color(TITLE).size(18.0));
            ui.label(
                egui::RichText::new("Select text in another app, then press Correct")
                    .color(HINT)
                    .size(11.0),
            );
            ui.add_space(6.0);

            let busy = self.handle.current_phase().is_busy();
            let button = egui::Button::new(egui::RichText::new(self.button_label()).size(16.0));
            if ui.add_enabled(!busy, button).clicked() {
                self.request_correction();
            }

            if let Some(status) = &self.status {
                let (text, color) = match status {
                    PanelStatus::Info(text) => (text.as_str(), INFO),
                    PanelStatus::Error(text) => (text.as_str(), ERROR),
                };
                ui.label(egui::RichText::new(text).color(color).size(11.0));
            }
        });

        if !self.original.is_empty() {
            ui.add_space(6.0);
            ui.label(egui::RichText::new("Original").color(MUTED).size(11.0));
            egui::ScrollArea::vertical()
                .id_salt("original")
                .max_height(70.0)
                .show(ui, |ui| ui.label(egui::RichText::new(&self.original).size(12.0)));
        }

        if !self.corrected.is_empty() {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Corrected").color(MUTED).size(11.0));
                if ui.small_button("Copy").clicked() {
                    ctx.copy_text(self.corrected.clone());
                }
            });
            egui::ScrollArea::vertical()
                .id_salt("corrected")
                .max_height(70.0)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(&self.corrected).color(CORRECTED).size(12.0))
                });
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
            ui.label(egui::RichText::new(&self.summary).color(MUTED).size(10.0));
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
