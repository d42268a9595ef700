//! Logger setup.
//!
//! `env_logger` with a default filter of `info`; `RUST_LOG` overrides it.
//! When `logging.file` is set, lines are appended to that file instead of
//! going to stderr.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::LoggingConfig;

/// Install the global logger.  Call once, before anything logs.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let mut builder = builder();
    if let Some(path) = &config.file {
        builder.target(env_logger::Target::Pipe(Box::new(open_log_file(path)?)));
    }
    builder.try_init().context("installing logger")?;
    Ok(())
}

fn builder() -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
