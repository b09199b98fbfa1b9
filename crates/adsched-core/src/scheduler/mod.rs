//! Download scheduler.
//!
//! Holds one entry per submitted transfer, computes each entry's scheduled
//! time from its [`SchedulePreference`] and the bandwidth forecast, and on
//! every tick hands due entries to the [`AdmissionQueue`]. An entry becomes
//! Running only once it holds an admission slot; the handle's terminal report
//! (or a Cancel) moves it to a terminal status and frees the slot, and the
//! next tick removes it.
//!
//! Lock order: the entry table and the admission queue's active set are never
//! held together.

mod admit;
mod entry;
mod error;
mod preference;
mod timing;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::admission::{AdmissionQueue, PriorityClass};
use crate::clock::Clock;
use crate::forecast::{Forecaster, HourlyPredictions, Prediction};
use crate::lifecycle::{TaskId, TransferHandle};

use admit::PendingAdmission;
use entry::ScheduledEntry;

pub use entry::{ScheduleInfo, ScheduleStatus};
pub use error::{ControlError, SubmitError};
pub use preference::{SchedulePreference, SchedulePriority};
pub use timing::{
    in_off_peak, next_off_peak, BEST_EFFORT_HORIZON_HOURS, OFF_PEAK_END_HOUR, OFF_PEAK_START_HOUR,
};

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Another tick was still running; this one did nothing.
    pub skipped: bool,
    /// Terminal entries removed.
    pub reaped: usize,
    /// Due entries handed to the admission queue.
    pub dispatched: usize,
}

/// Result of [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A Pending entry was dropped; its handle was never touched.
    Removed,
    /// A Running entry was cancelled and its handle told to stop.
    Cancelled,
    /// The entry had already reached a terminal status.
    AlreadyFinished,
    /// No entry with that id.
    NotFound,
}

pub struct Scheduler {
    entries: Mutex<HashMap<TaskId, ScheduledEntry>>,
    forecaster: Arc<Forecaster>,
    queue: Arc<AdmissionQueue>,
    clock: Arc<dyn Clock>,
    next_seq: AtomicU64,
    tick_gate: Mutex<()>,
    wake: Notify,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(
        forecaster: Arc<Forecaster>,
        queue: Arc<AdmissionQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            forecaster,
            queue,
            clock,
            next_seq: AtomicU64::new(0),
            tick_gate: Mutex::new(()),
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn forecaster(&self) -> &Arc<Forecaster> {
        &self.forecaster
    }

    pub fn queue(&self) -> &Arc<AdmissionQueue> {
        &self.queue
    }

    /// Register a transfer. The scheduled time is computed once, here.
    pub fn submit(
        &self,
        handle: Arc<dyn TransferHandle>,
        preference: SchedulePreference,
    ) -> Result<TaskId, SubmitError> {
        if self.shutdown.is_cancelled() {
            return Err(SubmitError::ShutDown);
        }
        let task_id = handle.id().to_string();
        let now = self.clock.now();
        let scheduled_time = timing::scheduled_time(&preference, now, &self.forecaster);
        let priority = preference.priority;
        {
            let mut entries = self.entries.lock();
            if entries.contains_key(&task_id) {
                return Err(SubmitError::Duplicate(task_id));
            }
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            entries.insert(
                task_id.clone(),
                ScheduledEntry::new(handle, preference, scheduled_time, seq),
            );
        }
        tracing::info!(
            task = %task_id,
            priority = %priority,
            scheduled = %scheduled_time,
            "download scheduled"
        );
        if scheduled_time <= now {
            self.wake.notify_one();
        }
        Ok(task_id)
    }

    /// Cancel an entry. Safe to call repeatedly and for unknown ids.
    pub fn cancel(&self, task_id: &str) -> CancelOutcome {
        let running = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(task_id) else {
                return CancelOutcome::NotFound;
            };
            match entry.status {
                ScheduleStatus::Pending => {
                    if let Some(entry) = entries.remove(task_id) {
                        if let Some(admission) = entry.admission {
                            admission.cancel();
                        }
                    }
                    tracing::info!(task = %task_id, "pending download removed");
                    return CancelOutcome::Removed;
                }
                ScheduleStatus::Running => {
                    entry.status = ScheduleStatus::Cancelled;
                    Arc::clone(&entry.handle)
                }
                _ => return CancelOutcome::AlreadyFinished,
            }
        };
        running.cancel();
        self.queue.dequeue(task_id);
        tracing::info!(task = %task_id, "running download cancelled");
        CancelOutcome::Cancelled
    }

    /// Change an entry's bandwidth-share class. Running entries are
    /// re-allocated immediately.
    pub fn update_priority(
        &self,
        task_id: &str,
        class: Option<PriorityClass>,
    ) -> Result<(), ControlError> {
        let running = {
            let mut entries = self.entries.lock();
            let entry = entries
                .get_mut(task_id)
                .ok_or_else(|| ControlError::UnknownEntry(task_id.to_string()))?;
            if entry.status.is_terminal() {
                return Err(ControlError::Finished(task_id.to_string()));
            }
            entry.preference.class = class;
            entry.status == ScheduleStatus::Running
        };
        if running {
            self.queue.update_priority(task_id, class);
        }
        Ok(())
    }

    pub fn pause(&self, task_id: &str) -> Result<(), ControlError> {
        self.running_handle(task_id)?.pause();
        tracing::info!(task = %task_id, "download paused");
        Ok(())
    }

    pub fn resume(&self, task_id: &str) -> Result<(), ControlError> {
        self.running_handle(task_id)?.resume();
        tracing::info!(task = %task_id, "download resumed");
        Ok(())
    }

    fn running_handle(&self, task_id: &str) -> Result<Arc<dyn TransferHandle>, ControlError> {
        let entries = self.entries.lock();
        let entry = entries
            .get(task_id)
            .ok_or_else(|| ControlError::UnknownEntry(task_id.to_string()))?;
        match entry.status {
            ScheduleStatus::Running => Ok(Arc::clone(&entry.handle)),
            ScheduleStatus::Pending => Err(ControlError::NotRunning(task_id.to_string())),
            _ => Err(ControlError::Finished(task_id.to_string())),
        }
    }

    /// Current view of one entry; `None` once it has been removed.
    pub fn status(&self, task_id: &str) -> Option<ScheduleInfo> {
        self.entries.lock().get(task_id).map(|e| e.info(task_id))
    }

    /// All entries, ordered by scheduled time then id.
    pub fn statuses(&self) -> Vec<ScheduleInfo> {
        let mut out: Vec<ScheduleInfo> = self
            .entries
            .lock()
            .iter()
            .map(|(id, e)| e.info(id))
            .collect();
        out.sort_by(|a, b| {
            a.scheduled_time
                .cmp(&b.scheduled_time)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        out
    }

    pub fn predict_bandwidth(&self, at: NaiveDateTime) -> Prediction {
        self.forecaster.predict(at)
    }

    pub fn hourly_predictions(&self, start: NaiveDateTime, hours: u32) -> HourlyPredictions<'_> {
        self.forecaster.hourly_predictions(start, hours)
    }

    /// One scheduling pass: refresh the forecast, drop terminal entries and
    /// hand due Pending entries to the admission queue. Skipped if a pass is
    /// already in progress. Must be called from within a Tokio runtime.
    pub fn tick(self: &Arc<Self>) -> TickReport {
        let Some(_gate) = self.tick_gate.try_lock() else {
            tracing::debug!("tick skipped: previous tick still running");
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        };

        self.forecaster.update_from_store();
        self.queue.rebalance();

        let now = self.clock.now();
        let (reaped, due) = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, e| !e.status.is_terminal());
            let reaped = before - entries.len();

            let mut due = Vec::new();
            for (id, entry) in entries.iter_mut() {
                if !entry.is_ready(now) {
                    continue;
                }
                let cancel = self.shutdown.child_token();
                entry.admission = Some(cancel.clone());
                due.push(PendingAdmission {
                    task_id: id.clone(),
                    seq: entry.seq,
                    request: entry.admission_request(),
                    cancel,
                });
            }
            (reaped, due)
        };

        let dispatched = due.len();
        for job in due {
            tokio::spawn(Arc::clone(self).admit(job));
        }
        if reaped > 0 || dispatched > 0 {
            tracing::debug!(reaped, dispatched, "tick");
        }
        TickReport {
            skipped: false,
            reaped,
            dispatched,
        }
    }

    /// Tick every `interval` (and whenever a submission is already due)
    /// until [`Scheduler::shutdown`].
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_secs = interval.as_secs_f64(), "scheduler running");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }
            self.tick();
        }
        tracing::info!("scheduler stopped");
    }

    /// Stop ticking, abandon in-flight admissions and refuse new submissions.
    /// Running transfers are left to the transfer layer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.queue.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
