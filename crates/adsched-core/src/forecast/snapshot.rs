//! Serializable snapshot of the forecast history.

use serde::{Deserialize, Serialize};

use crate::samples::Sample;

use super::buckets::Buckets;
use super::{Forecaster, History};

/// Snapshot for JSON persistence. Only the samples are stored; the
/// (weekday, hour) buckets are rebuilt from them on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedHistory {
    #[serde(default = "default_version")]
    pub version: u8,
    pub samples: Vec<Sample>,
}

fn default_version() -> u8 {
    1
}

impl Forecaster {
    /// Build a serializable snapshot of the current history (oldest first).
    pub fn to_snapshot(&self) -> PersistedHistory {
        PersistedHistory {
            version: 1,
            samples: self.history.lock().buckets.all_samples(),
        }
    }

    /// Replace the history with `snapshot`, dropping samples past retention.
    /// Returns how many samples were kept.
    pub fn restore_snapshot(&self, snapshot: PersistedHistory) -> usize {
        let cutoff = self.clock.now() - self.retention;
        let mut buckets = Buckets::default();
        let mut newest = None;
        for sample in snapshot.samples {
            if sample.timestamp < cutoff {
                continue;
            }
            newest = newest.max(Some(sample.timestamp));
            buckets.insert(sample);
        }
        let kept = buckets.len();
        *self.history.lock() = History {
            buckets,
            ingested_until: newest,
        };
        kept
    }
}
