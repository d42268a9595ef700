//! Application entry point.
//!
//! # Startup sequence
//!
//! 1. Load [`AppConfig`] (defaults on first run) and apply env overrides.
//! 2. Initialise logging.
//! 3. Validate config; refuse to start without an API key.
//! 4. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 5. Build the correction service and input simulator.
//! 6. Spawn the pipeline orchestrator, the overlay controller and the
//!    hotkey dispatcher on the runtime.
//! 7. Start the rdev hotkey listener thread.
//! 8. Run [`eframe::run_native`] for the overlay and the control panel,
//!    which blocks the main thread until the window is closed; with both
//!    disabled, wait for Ctrl-C instead.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::mpsc;

use text_corrector::{
    config::{AppConfig, AppPaths},
    hotkey::{self, HotkeyCombo, HotkeyEvent, HotkeyListener},
    inject::SystemInput,
    llm::ApiCorrector,
    logging,
    overlay::{
        self, ControlPanel, OverlayController, OverlayWindow, PanelSwitch, RepaintSlot,
        WatchRenderer,
    },
    pipeline::PipelineOrchestrator,
};

fn main() -> Result<()> {
    // 1. Configuration
    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    config.apply_env();

    // 2. Logging
    logging::init(&config.logging)?;
    log::info!("text-corrector starting up");
    if let Some(e) = load_error {
        log::warn!("Failed to load config ({e:#}); using defaults");
    }

    // 3. Validation
    config.validate().context("invalid configuration")?;
    if config.api_key().is_none() {
        bail!(
            "no API key: set OPENAI_API_KEY or llm.api_key in {}",
            AppPaths::new().settings_file.display()
        );
    }
    let mut bindings = vec![
        (
            HotkeyCombo::parse(&config.hotkey.correct)?,
            HotkeyEvent::CorrectSelection,
        ),
        (
            HotkeyCombo::parse(&config.hotkey.cancel)?,
            HotkeyEvent::CancelCorrection,
        ),
    ];
    if config.panel.enabled {
        bindings.push((
            HotkeyCombo::parse(&config.hotkey.panel)?,
            HotkeyEvent::TogglePanel,
        ));
    }

    // 4. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    // 5. Collaborators
    let service = Arc::new(ApiCorrector::from_config(&config.llm));
    let input = Arc::new(SystemInput::new(Duration::from_millis(
        config.clipboard.paste_delay_ms,
    )));

    // 6. Pipeline, overlay controller, dispatcher
    let repaint = RepaintSlot::default();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let overlay_updates = config.overlay.enabled.then_some(update_tx);
    let (orchestrator, handle) =
        PipelineOrchestrator::from_config(&config, input, service, overlay_updates);

    let panel_switch = config.panel.enabled.then(|| PanelSwitch::new(repaint.clone()));
    let panel = match &panel_switch {
        Some(switch) => {
            let (outcome_tx, outcome_rx) = mpsc::channel(16);
            rt.spawn(orchestrator.with_outcomes(outcome_tx).run());
            switch.set_open(config.panel.open_at_startup);
            Some(ControlPanel::new(
                handle.clone(),
                switch.clone(),
                outcome_rx,
                &config,
            ))
        }
        None => {
            rt.spawn(orchestrator.run());
            None
        }
    };

    let indicator = config.overlay.enabled.then(|| {
        let (renderer, indicator) = WatchRenderer::new(repaint.clone());
        rt.spawn(OverlayController::new(renderer).run(update_rx));
        indicator
    });

    let (hotkey_tx, hotkey_rx) = mpsc::channel(16);
    rt.spawn(hotkey::dispatch(hotkey_rx, handle, panel_switch));

    // 7. Hotkey listener thread
    let _hotkey_listener = HotkeyListener::start(bindings, hotkey_tx)?;
    log::info!(
        "ready: {} corrects the selection, {} cancels (model {})",
        config.hotkey.correct,
        config.hotkey.cancel,
        config.llm.model
    );
    if config.panel.enabled {
        log::info!("{} toggles the control panel", config.hotkey.panel);
    }

    // 8. Overlay and panel (blocks until the window is closed) or Ctrl-C
    if indicator.is_some() || panel.is_some() {
        let overlay_config = config.overlay.clone();
        eframe::run_native(
            "text-corrector",
            overlay::native_options(),
            Box::new(move |cc| {
                Ok(Box::new(OverlayWindow::new(
                    cc,
                    indicator,
                    panel,
                    &repaint,
                    &overlay_config,
                )))
            }),
        )
        .map_err(|e| anyhow!("overlay window failed: {e}"))?;
    } else {
        rt.block_on(tokio::signal::ctrl_c())
            .context("waiting for Ctrl-C")?;
    }

    log::info!("text-corrector shutting down");
    Ok(())
}
