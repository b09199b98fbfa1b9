//! Bandwidth forecaster.
//!
//! Keeps per-hour and per-(weekday, hour) sample history (30-day retention by
//! default) and combines three estimates into a [`Prediction`]:
//! - median of the target hour's bucket,
//! - median of the target (weekday, hour) bucket,
//! - live average of the most recent samples in the [`SampleStore`].
//!
//! Medians keep a single stalled transfer from dragging an hour's estimate
//! down. Empty buckets never raise: they drop out of the weighted average and
//! pull confidence toward zero.

mod buckets;
mod persist;
mod prediction;
mod snapshot;
mod stats;

use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::samples::{Sample, SampleStore};

use buckets::{hour_index, weekday_index, Buckets};

pub use prediction::{HourlyPredictions, Prediction};
pub use snapshot::PersistedHistory;

/// Weights of the hourly, daily-slot and recent estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastWeights {
    pub hourly: f64,
    pub daily: f64,
    pub recent: f64,
}

impl Default for ForecastWeights {
    fn default() -> Self {
        Self {
            hourly: 0.4,
            daily: 0.4,
            recent: 0.2,
        }
    }
}

/// Bucketed history plus the store watermark, guarded together.
#[derive(Debug, Default)]
struct History {
    buckets: Buckets,
    /// Timestamp of the newest store sample already folded into the buckets.
    ingested_until: Option<NaiveDateTime>,
}

/// Historical bandwidth model. Cheap to share behind an `Arc`.
pub struct Forecaster {
    history: Mutex<History>,
    store: Arc<SampleStore>,
    clock: Arc<dyn Clock>,
    weights: ForecastWeights,
    retention: chrono::Duration,
    recent_window: usize,
}

impl Forecaster {
    pub fn new(
        store: Arc<SampleStore>,
        clock: Arc<dyn Clock>,
        weights: ForecastWeights,
        retention: chrono::Duration,
        recent_window: usize,
    ) -> Self {
        Self {
            history: Mutex::new(History::default()),
            store,
            clock,
            weights,
            retention,
            recent_window: recent_window.max(1),
        }
    }

    pub fn weights(&self) -> ForecastWeights {
        self.weights
    }

    /// Number of samples currently held in the history buckets.
    pub fn history_len(&self) -> usize {
        self.history.lock().buckets.len()
    }

    /// Insert a sample into both bucket sets and prune anything past retention.
    pub fn add_sample(&self, sample: Sample) {
        let cutoff = self.clock.now() - self.retention;
        let mut history = self.history.lock();
        history.buckets.insert(sample);
        history.buckets.prune(cutoff);
    }

    /// Fold store samples recorded since the last call into the history as one
    /// averaged sample. Returns the aggregate that was added, if any.
    pub fn update_from_store(&self) -> Option<Sample> {
        let watermark = self.history.lock().ingested_until;
        let fresh = match watermark {
            Some(w) => self.store.newer_than(w),
            None => self.store.last_n(self.store.capacity()),
        };
        let newest = *fresh.last()?;
        let total: f64 = fresh.iter().map(|s| s.bytes_per_sec as f64).sum();
        let aggregate = Sample {
            bytes_per_sec: (total / fresh.len() as f64).round() as u64,
            ..newest
        };

        let cutoff = self.clock.now() - self.retention;
        let mut history = self.history.lock();
        history.buckets.insert(aggregate);
        history.buckets.prune(cutoff);
        history.ingested_until = Some(newest.timestamp);
        tracing::debug!(
            samples = fresh.len(),
            bps = aggregate.bytes_per_sec,
            "folded store samples into forecast history"
        );
        Some(aggregate)
    }

    /// Predict available bandwidth at `target`.
    pub fn predict(&self, target: NaiveDateTime) -> Prediction {
        let hour = hour_index(&target);
        let day = weekday_index(&target);
        let (hourly, daily) = {
            let history = self.history.lock();
            let b = &history.buckets;
            (
                stats::median(b.hour(hour).iter().map(|s| s.bytes_per_sec as f64)),
                stats::median(b.slot(day, hour).iter().map(|s| s.bytes_per_sec as f64)),
            )
        };
        let usage = self.store.current_usage(self.recent_window);
        let recent = (usage.samples > 0).then_some(usage.average_bytes_per_sec);

        let w = self.weights;
        let estimate = stats::weighted_average(&[
            (hourly, w.hourly),
            (daily, w.daily),
            (recent, w.recent),
        ]);
        let confidence = stats::confidence(&[
            hourly.unwrap_or(0.0),
            daily.unwrap_or(0.0),
            recent.unwrap_or(0.0),
        ]);

        Prediction {
            hour: hour as u32,
            estimated_bytes_per_sec: estimate,
            confidence,
            link: usage.link,
        }
    }

    /// `count` predictions at hourly offsets from `start`, computed lazily.
    pub fn hourly_predictions(&self, start: NaiveDateTime, count: u32) -> HourlyPredictions<'_> {
        HourlyPredictions::new(self, start, count)
    }
}
