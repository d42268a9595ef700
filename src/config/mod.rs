//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, TOML persistence via
//! `AppConfig::load` / `AppConfig::save`, and environment overrides.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ClipboardConfig, HotkeyConfig, LlmConfig, LoggingConfig, OverlayConfig,
    PanelConfig, RetryConfig, DEFAULT_CORRECTION_PROMPT,
};
