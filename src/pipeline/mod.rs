//! Correction pipeline: phase machine, orchestrator and job reports.
//!
//! # Architecture
//!
//! ```text
//! HotkeyEvent ──▶ dispatch ──▶ OrchestratorHandle::trigger() / cancel()
//!                                     │  CAS on PhaseCell, epoch ─▶ mpsc(1)
//!                                     ▼
//!                     PipelineOrchestrator::run()  ← one tokio task
//!                                     │
//!          ClipboardGuard (spawn_blocking) · CorrectionClient (async)
//!                                     │
//! PhaseCell (watch) ── PhaseUpdate (unbounded mpsc) ──▶ OverlayController
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use text_corrector::config::AppConfig;
//! use text_corrector::inject::SystemInput;
//! use text_corrector::llm::ApiCorrector;
//! use text_corrector::pipeline::PipelineOrchestrator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let (overlay_tx, _overlay_rx) = mpsc::unbounded_channel();
//!
//!     let (orchestrator, handle) = PipelineOrchestrator::from_config(
//!         &config,
//!         Arc::new(SystemInput::default()),
//!         Arc::new(ApiCorrector::from_config(&config.llm)),
//!         Some(overlay_tx),
//!     );
//!     tokio::spawn(orchestrator.run());
//!
//!     // handle is passed to hotkey::dispatch(...)
//!     let accepted = handle.trigger();
//!     println!("accepted: {accepted}");
//! }
//! ```

pub mod job;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use job::{CorrectionJob, JobOutcome};
pub use runner::{OrchestratorHandle, PipelineOrchestrator};
pub use state::{Anchor, ErrorKind, PhaseCell, PhaseSnapshot, PhaseUpdate, PipelinePhase};
