//! Log setup for the scheduler and the CLI.
//!
//! Events go to `adsched.log` under [`SchedConfig::log_dir`] (the XDG state
//! dir when unset). `RUST_LOG` takes precedence over
//! [`SchedConfig::log_filter`]; a filter that does not parse falls back to
//! [`DEFAULT_FILTER`] and is reported once logging is up.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::SchedConfig;

/// Filter used when neither `RUST_LOG` nor the config gives a usable one.
pub const DEFAULT_FILTER: &str = "info,adsched=debug";

const LOG_FILE_NAME: &str = "adsched.log";

/// Where [`init_logging`] writes for this config.
pub fn log_file_path(cfg: &SchedConfig) -> Result<PathBuf> {
    let dir = match &cfg.log_dir {
        Some(dir) => dir.clone(),
        None => xdg::BaseDirectories::with_prefix("adsched")?
            .get_state_home()
            .join("adsched"),
    };
    Ok(dir.join(LOG_FILE_NAME))
}

/// Log to the file from [`log_file_path`]. Returns the path in use; on error
/// nothing is installed and the caller can use [`init_logging_stderr`].
pub fn init_logging(cfg: &SchedConfig) -> Result<PathBuf> {
    let path = log_file_path(cfg)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let (filter, rejected) = filter_for(cfg);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    report_rejected(cfg, rejected);
    tracing::info!(path = %path.display(), "adsched logging initialized");
    Ok(path)
}

/// Log to stderr only.
pub fn init_logging_stderr(cfg: &SchedConfig) {
    let (filter, rejected) = filter_for(cfg);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    report_rejected(cfg, rejected);
}

fn filter_for(cfg: &SchedConfig) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => configured_filter(&cfg.log_filter),
    }
}

fn configured_filter(directives: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some(e)),
    }
}

fn report_rejected(cfg: &SchedConfig, rejected: Option<ParseError>) {
    if let Some(e) = rejected {
        tracing::warn!(
            filter = %cfg.log_filter,
            "log_filter rejected ({}); using {}",
            e,
            DEFAULT_FILTER
        );
    }
}
