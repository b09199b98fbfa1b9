//! Persist forecast history to disk (JSON under the XDG state dir) so the
//! hourly statistics survive restarts.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{Forecaster, PersistedHistory};

impl Forecaster {
    /// Default path for the history file: `~/.local/state/adsched/history.json`.
    pub fn default_history_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("adsched")?;
        Ok(xdg_dirs.get_state_home().join("adsched").join("history.json"))
    }

    /// Save the current history to `path` (creates the parent dir if needed).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let snapshot = self.to_snapshot();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string(&snapshot).context("serialize forecast history")?;
        std::fs::write(path, json)
            .with_context(|| format!("write forecast history: {}", path.display()))?;
        tracing::debug!(
            samples = snapshot.samples.len(),
            path = %path.display(),
            "saved forecast history"
        );
        Ok(())
    }

    /// Load history from `path`, replacing the in-memory buckets. A missing file
    /// is not an error and yields `Ok(None)`; otherwise returns the number of
    /// samples kept after retention.
    pub fn load_from_path(&self, path: &Path) -> Result<Option<usize>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read forecast history: {}", path.display()))
            }
        };
        let snapshot: PersistedHistory = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse forecast history: {}", path.display()))?;
        Ok(Some(self.restore_snapshot(snapshot)))
    }
}
