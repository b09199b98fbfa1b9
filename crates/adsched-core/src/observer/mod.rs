//! Network observer: turns cumulative interface counters into throughput samples.
//!
//! On every tick the observer reads the counters, computes the per-interface
//! delta since the previous read, and records one [`Sample`] in the shared
//! [`SampleStore`]. A failed read is logged and skipped; the loop never stops
//! because of one bad tick.

mod counters;
mod procfs;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::samples::{LinkType, Sample, SampleStore};

pub use counters::{CounterError, CounterSource, InterfaceCounters};
pub use procfs::ProcNetDev;

/// Counters from the previous successful read.
#[derive(Debug)]
struct Baseline {
    at: Instant,
    rx: HashMap<String, u64>,
}

/// Periodic throughput sampler feeding a [`SampleStore`].
pub struct NetworkObserver {
    source: Arc<dyn CounterSource>,
    store: Arc<SampleStore>,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    baseline: Mutex<Option<Baseline>>,
}

impl NetworkObserver {
    pub fn new(
        source: Arc<dyn CounterSource>,
        store: Arc<SampleStore>,
        clock: Arc<dyn Clock>,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            retention,
            baseline: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    /// Take a baseline read without recording a sample.
    pub fn prime(&self) {
        self.observe_at(Instant::now());
    }

    /// Read counters once and record a sample. Returns the recorded sample,
    /// or `None` when this read only established the baseline or failed.
    pub fn sample_once(&self) -> Option<Sample> {
        self.observe_at(Instant::now())
    }

    pub(crate) fn observe_at(&self, mono_now: Instant) -> Option<Sample> {
        let counters = match self.source.read_counters() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("network counter read failed: {}", e);
                return None;
            }
        };

        let current: HashMap<String, u64> = counters
            .iter()
            .map(|c| (c.name.clone(), c.rx_bytes))
            .collect();

        let previous = self.baseline.lock().replace(Baseline {
            at: mono_now,
            rx: current,
        });
        let previous = previous?;

        let elapsed = mono_now
            .saturating_duration_since(previous.at)
            .max(Duration::from_millis(1))
            .as_secs_f64();

        let mut total: u64 = 0;
        let mut dominant: Option<(u64, LinkType)> = None;
        for c in &counters {
            // Counter resets (or interfaces that just appeared) contribute nothing.
            let delta = previous
                .rx
                .get(&c.name)
                .map(|last| c.rx_bytes.saturating_sub(*last))
                .unwrap_or(0);
            total = total.saturating_add(delta);
            if dominant.map_or(true, |(best, _)| delta > best) {
                dominant = Some((delta, c.link));
            }
        }
        let link = dominant.map(|(_, l)| l).unwrap_or_default();
        let signal = if link == LinkType::Wifi {
            self.source.signal_quality()
        } else {
            None
        };

        let now = self.clock.now();
        let sample = self.store.record(
            Sample::new(now, (total as f64 / elapsed).round() as u64, link).with_signal(signal),
        );
        self.store.prune_older_than(sample.timestamp - self.retention);
        tracing::trace!(bps = sample.bytes_per_sec, link = link.as_str(), "sample");
        Some(sample)
    }

    /// Sample every `interval` until `shutdown` fires. Ticks that fall behind are skipped.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        self.prime();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the baseline was just taken.
        ticker.tick().await;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "network observer started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sample_once();
                }
            }
        }
        tracing::debug!("network observer stopped");
    }
}
