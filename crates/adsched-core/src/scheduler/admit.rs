//! Per-entry admission task: wait for a slot, promote to Running, then follow
//! the handle's reports until a terminal outcome frees the slot again.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::admission::{AdmissionError, AdmissionRequest, PriorityClass};
use crate::lifecycle::{Progress, TaskId, TerminalEvent, TransferHandle, TransferReport};

use super::entry::ScheduleStatus;
use super::Scheduler;

/// A due entry handed from a tick to its admission task.
pub(super) struct PendingAdmission {
    pub(super) task_id: TaskId,
    pub(super) seq: u64,
    pub(super) request: AdmissionRequest,
    pub(super) cancel: CancellationToken,
}

enum Promotion {
    Started {
        handle: Arc<dyn TransferHandle>,
        reports: watch::Receiver<TransferReport>,
        class: Option<PriorityClass>,
    },
    Stale,
}

impl Scheduler {
    pub(super) async fn admit(self: Arc<Self>, job: PendingAdmission) {
        let requested_class = job.request.class;
        match self.queue.enqueue(job.request, &job.cancel).await {
            Ok(()) => {}
            Err(AdmissionError::Cancelled) => {
                tracing::debug!(task = %job.task_id, "admission abandoned");
                return;
            }
            Err(e) => {
                // Leave the entry Pending so a later tick retries.
                tracing::debug!(task = %job.task_id, "admission failed: {}", e);
                self.clear_admission(&job.task_id, job.seq);
                return;
            }
        }

        let promotion = {
            let mut entries = self.entries.lock();
            match entries.get_mut(&job.task_id) {
                Some(entry) if entry.seq == job.seq && entry.status == ScheduleStatus::Pending => {
                    entry.status = ScheduleStatus::Running;
                    entry.admission = None;
                    Promotion::Started {
                        handle: Arc::clone(&entry.handle),
                        reports: entry.handle.subscribe(),
                        class: entry.preference.class,
                    }
                }
                _ => Promotion::Stale,
            }
        };

        match promotion {
            Promotion::Stale => {
                // Cancelled while we were acquiring the slot.
                self.queue.dequeue(&job.task_id);
                tracing::debug!(task = %job.task_id, "admitted entry is gone; slot returned");
            }
            Promotion::Started {
                handle,
                reports,
                class,
            } => {
                // Outside the table lock. A Cancel that lands first has already
                // made the handle terminal, and a terminal handle ignores start.
                handle.start();
                if class != requested_class {
                    self.queue.update_priority(&job.task_id, class);
                }
                tracing::info!(task = %job.task_id, "download started");
                self.follow(&job.task_id, job.seq, reports).await;
            }
        }
    }

    async fn follow(&self, task_id: &str, seq: u64, mut reports: watch::Receiver<TransferReport>) {
        loop {
            let report = reports.borrow_and_update().clone();
            if let Some(terminal) = report.terminal {
                self.finish(task_id, seq, report.progress, terminal);
                return;
            }
            self.record_progress(task_id, seq, report.progress);

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                changed = reports.changed() => {
                    if changed.is_err() {
                        let reason = "transfer handle dropped".to_string();
                        self.finish(task_id, seq, report.progress, TerminalEvent::Failed(reason));
                        return;
                    }
                }
            }
        }
    }

    fn record_progress(&self, task_id: &str, seq: u64, progress: Progress) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(task_id) {
            if entry.seq == seq && entry.status == ScheduleStatus::Running {
                entry.progress = progress;
            }
        }
    }

    /// Apply a terminal outcome. Only the Running -> terminal transition
    /// releases the admission slot; a Cancel that got there first already did.
    fn finish(&self, task_id: &str, seq: u64, progress: Progress, terminal: TerminalEvent) {
        let status = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(task_id) else {
                return;
            };
            if entry.seq != seq || entry.status != ScheduleStatus::Running {
                return;
            }
            entry.progress = progress;
            entry.status = match terminal {
                TerminalEvent::Completed => ScheduleStatus::Completed,
                TerminalEvent::Failed(reason) => {
                    entry.last_error = Some(reason);
                    ScheduleStatus::Failed
                }
                TerminalEvent::Cancelled => ScheduleStatus::Cancelled,
            };
            entry.status
        };
        self.queue.dequeue(task_id);
        tracing::info!(task = %task_id, status = %status, "download finished");
    }

    fn clear_admission(&self, task_id: &str, seq: u64) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(task_id) {
            if entry.seq == seq && entry.status == ScheduleStatus::Pending {
                entry.admission = None;
            }
        }
    }
}
