//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section uses `#[serde(default)]`, so a partial `settings.toml` only
//! overrides what it names.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::hotkey::HotkeyCombo;

/// Default instruction sent as the system prompt for every correction.
pub const DEFAULT_CORRECTION_PROMPT: &str = "\
You are an expert proofreader. Correct the grammar, spelling and punctuation \
of the text you are given. Keep the original meaning, tone and style as much \
as possible. Reply ONLY with the corrected text, without introductions, \
explanations or comments. If the text is already correct, return it unchanged.";

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings, written as `modifier+...+key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Starts a correction of the current selection.
    pub correct: String,
    /// Cancels the outstanding correction.
    pub cancel: String,
    /// Shows or hides the control panel.
    pub panel: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            correct: "ctrl+alt+c".into(),
            cancel: "ctrl+alt+x".into(),
            panel: "ctrl+alt+g".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the correction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Bearer token; usually supplied through `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// System prompt for the correction.
    pub prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.3,
            timeout_secs: 10,
            prompt: DEFAULT_CORRECTION_PROMPT.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Backoff policy for retryable correction failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay.
    pub max_delay_ms: u64,
    /// Extra random delay as a fraction of the computed delay, in `[0, 1)`.
    pub jitter: f64,
    /// Extra growth factor applied when the service throttles us.
    pub rate_limit_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter: 0.2,
            rate_limit_multiplier: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ClipboardConfig
// ---------------------------------------------------------------------------

/// Timing of selection capture and paste.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Budget for the copied selection to appear on the clipboard.
    pub capture_timeout_ms: u64,
    /// Gap between clipboard reads while waiting for the copy.
    pub poll_interval_ms: u64,
    /// How many times the copy shortcut is sent within the budget.
    pub copy_attempts: u32,
    /// Pause before copying, so the hotkey modifiers can be released.
    pub pre_capture_delay_ms: u64,
    /// Pause between writing the clipboard and sending paste.
    pub paste_delay_ms: u64,
    /// Pause after paste before the original clipboard is restored.
    pub settle_delay_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: 300,
            poll_interval_ms: 20,
            copy_attempts: 2,
            pre_capture_delay_ms: 100,
            paste_delay_ms: 50,
            settle_delay_ms: 150,
        }
    }
}

// ---------------------------------------------------------------------------
// OverlayConfig
// ---------------------------------------------------------------------------

/// Status indicator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Show the floating indicator at all.
    pub enabled: bool,
    /// How long `Succeeded` / `Failed` stay on screen before `Idle`.
    pub terminal_display_ms: u64,
    /// Offset in pixels from the cursor anchor.
    pub offset: (i32, i32),
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            terminal_display_ms: 1_200,
            offset: (16, 16),
        }
    }
}

// ---------------------------------------------------------------------------
// PanelConfig
// ---------------------------------------------------------------------------

/// Control panel window: a "Correct" button plus the last job's texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Register the panel hotkey and host the panel window.
    pub enabled: bool,
    /// Open the panel at startup instead of waiting for the hotkey.
    pub open_at_startup: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_at_startup: false,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Log sink settings.  The level comes from `RUST_LOG` (default `info`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use text_corrector::config::AppConfig;
///
/// // Load (returns Default when file is missing), then apply env overrides
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hotkey: HotkeyConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub clipboard: ClipboardConfig,
    pub overlay: OverlayConfig,
    pub panel: PanelConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from `lookup`.  Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(prompt) = get("CORRECTION_PROMPT") {
            self.llm.prompt = prompt;
        }
        if let Some(model) = get("CORRECTION_MODEL") {
            self.llm.model = model;
        }
        if let Some(combo) = get("HOTKEY") {
            self.hotkey.correct = combo;
        }
        if let Some(combo) = get("CANCEL_HOTKEY") {
            self.hotkey.cancel = combo;
        }
        if let Some(combo) = get("PANEL_HOTKEY") {
            self.hotkey.panel = combo;
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let retry = &self.retry;
        if retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if !(0.0..1.0).contains(&retry.jitter) {
            bail!("retry.jitter must be in [0, 1), got {}", retry.jitter);
        }
        if retry.max_delay_ms < retry.base_delay_ms {
            bail!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                retry.max_delay_ms,
                retry.base_delay_ms
            );
        }
        if retry.rate_limit_multiplier < 1.0 {
            bail!("retry.rate_limit_multiplier must be at least 1.0");
        }
        if self.clipboard.poll_interval_ms == 0 {
            bail!("clipboard.poll_interval_ms must be positive");
        }
        if self.clipboard.copy_attempts == 0 {
            bail!("clipboard.copy_attempts must be at least 1");
        }
        HotkeyCombo::parse(&self.hotkey.correct).context("hotkey.correct")?;
        HotkeyCombo::parse(&self.hotkey.cancel).context("hotkey.cancel")?;
        if self.panel.enabled {
            HotkeyCombo::parse(&self.hotkey.panel).context("hotkey.panel")?;
        }
        Ok(())
    }

    /// The API key, if one is configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
