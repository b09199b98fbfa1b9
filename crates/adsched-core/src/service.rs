//! Wires the sample store, observer, forecaster, admission queue and
//! scheduler together from a [`SchedConfig`] and runs the periodic jobs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::admission::{AdmissionQueue, BandwidthAllocator, ForecastCapacity};
use crate::clock::Clock;
use crate::config::SchedConfig;
use crate::forecast::Forecaster;
use crate::observer::{CounterSource, NetworkObserver, ProcNetDev};
use crate::samples::SampleStore;
use crate::scheduler::Scheduler;

pub struct SchedulingService {
    config: SchedConfig,
    store: Arc<SampleStore>,
    observer: Arc<NetworkObserver>,
    forecaster: Arc<Forecaster>,
    queue: Arc<AdmissionQueue>,
    scheduler: Arc<Scheduler>,
}

impl SchedulingService {
    /// Build the service reading counters from the local `/proc`.
    pub fn from_config(config: &SchedConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_source(config, clock, Arc::new(ProcNetDev::default()))
    }

    /// Build the service with an explicit counter source.
    pub fn with_source(
        config: &SchedConfig,
        clock: Arc<dyn Clock>,
        source: Arc<dyn CounterSource>,
    ) -> Self {
        let store = Arc::new(SampleStore::new(config.sample_capacity));
        let observer = Arc::new(NetworkObserver::new(
            source,
            Arc::clone(&store),
            Arc::clone(&clock),
            config.retention(),
        ));
        let forecaster = Arc::new(Forecaster::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.weights(),
            config.retention(),
            config.recent_window,
        ));
        let capacity = Arc::new(ForecastCapacity::new(
            Arc::clone(&forecaster),
            Arc::clone(&clock),
            config.fallback_capacity_bytes_per_sec as f64,
        ));
        let queue = Arc::new(AdmissionQueue::new(
            config.max_concurrent_downloads,
            BandwidthAllocator::new(config.shares()),
            capacity,
        ));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&forecaster),
            Arc::clone(&queue),
            clock,
        ));
        Self {
            config: config.clone(),
            store,
            observer,
            forecaster,
            queue,
            scheduler,
        }
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    pub fn observer(&self) -> &Arc<NetworkObserver> {
        &self.observer
    }

    pub fn forecaster(&self) -> &Arc<Forecaster> {
        &self.forecaster
    }

    pub fn queue(&self) -> &Arc<AdmissionQueue> {
        &self.queue
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Spawn the observer loop and the scheduler tick loop. Both stop when
    /// `shutdown` is cancelled; the scheduler is shut down with them.
    pub fn start(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let observer = Arc::clone(&self.observer);
        let observer_task =
            tokio::spawn(observer.run(self.config.sample_interval(), shutdown.clone()));

        let scheduler = Arc::clone(&self.scheduler);
        let interval = self.config.tick_interval();
        let scheduler_task = tokio::spawn(async move {
            tokio::select! {
                _ = Arc::clone(&scheduler).run(interval) => {}
                _ = shutdown.cancelled() => scheduler.shutdown(),
            }
        });

        tracing::info!(
            max_concurrent = self.config.max_concurrent_downloads,
            tick_secs = interval.as_secs(),
            "scheduling service started"
        );
        vec![observer_task, scheduler_task]
    }
}
