//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir:
//!   Windows: %APPDATA%\text-corrector\
//!   macOS:   ~/Library/Application Support/text-corrector/
//!   Linux:   ~/.config/text-corrector/
//!
//! Data dir (default log location):
//!   Windows: %LOCALAPPDATA%\text-corrector\
//!   macOS:   ~/Library/Application Support/text-corrector/
//!   Linux:   ~/.local/share/text-corrector/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for log files.
    pub logs_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "text-corrector";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            logs_dir: data_dir.join("logs"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
