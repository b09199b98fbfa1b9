use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::admission::ClassShares;
use crate::forecast::ForecastWeights;

/// Global configuration loaded from `~/.config/adsched/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedConfig {
    /// Maximum number of downloads admitted at once.
    pub max_concurrent_downloads: usize,
    /// Seconds between scheduler ticks.
    pub tick_interval_secs: u64,
    /// Milliseconds between network observer samples.
    pub sample_interval_ms: u64,
    /// Number of samples the in-memory store keeps.
    pub sample_capacity: usize,
    /// Days of history the forecaster keeps.
    pub retention_days: u32,
    /// Number of most recent samples averaged for the live estimate.
    pub recent_window: usize,
    /// Capacity handed to the allocator while the forecaster has no estimate.
    pub fallback_capacity_bytes_per_sec: u64,
    /// `tracing` filter directives; `RUST_LOG` overrides them.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Directory for `adsched.log`; if missing, the XDG state dir.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Optional forecast weights; if missing, 0.4 / 0.4 / 0.2.
    #[serde(default)]
    pub weights: Option<ForecastWeights>,
    /// Optional class shares; if missing, 0.5 / 0.3 / 0.2 / 0.1.
    #[serde(default)]
    pub shares: Option<ClassShares>,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 5,
            tick_interval_secs: 60,
            sample_interval_ms: 1000,
            sample_capacity: 1000,
            retention_days: 30,
            recent_window: 10,
            fallback_capacity_bytes_per_sec: 10 * 1024 * 1024,
            log_filter: default_log_filter(),
            log_dir: None,
            weights: None,
            shares: None,
        }
    }
}

fn default_log_filter() -> String {
    crate::logging::DEFAULT_FILTER.to_string()
}

impl SchedConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    pub fn weights(&self) -> ForecastWeights {
        self.weights.unwrap_or_default()
    }

    pub fn shares(&self) -> ClassShares {
        self.shares.unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("adsched")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SchedConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SchedConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SchedConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: SchedConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
