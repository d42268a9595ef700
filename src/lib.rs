//! Hotkey-driven text correction.
//!
//! Press a global hotkey with text selected anywhere: the selection is
//! copied, sent to an LLM for grammar and spelling correction, and the
//! result is pasted back over it.  The user's clipboard is restored
//! afterwards and a small overlay next to the cursor shows progress.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `settings.toml`, environment overrides, validation |
//! | [`hotkey`] | rdev listener, combo matching, dispatch |
//! | [`inject`] | clipboard and key simulation, snapshot/restore guard |
//! | [`llm`] | correction service, error classification, backoff |
//! | [`pipeline`] | phase machine and the single-flight orchestrator |
//! | [`overlay`] | phase → indicator mapping, the eframe window, the control panel |
//! | [`logging`] | env_logger setup |

pub mod config;
pub mod hotkey;
pub mod inject;
pub mod llm;
pub mod logging;
pub mod overlay;
pub mod pipeline;
