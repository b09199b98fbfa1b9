//! Schedule entries and their public view.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

use crate::admission::{AdmissionRequest, PriorityClass};
use crate::lifecycle::{Progress, TaskId, TransferHandle};

use super::preference::{SchedulePreference, SchedulePriority};

/// Where an entry is in the scheduler's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleStatus {
    /// Waiting for its scheduled time or for an admission slot.
    Pending,
    /// Admitted and told to start.
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Running => "running",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Failed => "failed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScheduleStatus::Completed | ScheduleStatus::Failed | ScheduleStatus::Cancelled
        )
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one entry, as returned by `Scheduler::status`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleInfo {
    pub task_id: TaskId,
    pub priority: SchedulePriority,
    pub class: Option<PriorityClass>,
    pub status: ScheduleStatus,
    pub scheduled_time: NaiveDateTime,
    pub progress: Progress,
    /// Failure reason as reported by the transfer layer.
    pub last_error: Option<String>,
}

pub(super) struct ScheduledEntry {
    pub(super) handle: Arc<dyn TransferHandle>,
    pub(super) preference: SchedulePreference,
    pub(super) status: ScheduleStatus,
    pub(super) scheduled_time: NaiveDateTime,
    pub(super) progress: Progress,
    pub(super) last_error: Option<String>,
    /// Distinguishes this entry from an earlier one with the same id.
    pub(super) seq: u64,
    /// Set while an admission attempt is in flight; cancelling it abandons the wait.
    pub(super) admission: Option<CancellationToken>,
}

impl ScheduledEntry {
    pub(super) fn new(
        handle: Arc<dyn TransferHandle>,
        preference: SchedulePreference,
        scheduled_time: NaiveDateTime,
        seq: u64,
    ) -> Self {
        Self {
            handle,
            preference,
            status: ScheduleStatus::Pending,
            scheduled_time,
            progress: Progress::default(),
            last_error: None,
            seq,
            admission: None,
        }
    }

    /// Pending, due, and not already waiting on the admission queue.
    pub(super) fn is_ready(&self, now: NaiveDateTime) -> bool {
        self.status == ScheduleStatus::Pending
            && self.admission.is_none()
            && self.scheduled_time <= now
    }

    pub(super) fn admission_request(&self) -> AdmissionRequest {
        AdmissionRequest {
            handle: Arc::clone(&self.handle),
            class: self.preference.class,
            max_bytes_per_sec: self.preference.max_bytes_per_sec,
        }
    }

    pub(super) fn info(&self, task_id: &str) -> ScheduleInfo {
        ScheduleInfo {
            task_id: task_id.to_string(),
            priority: self.preference.priority,
            class: self.preference.class,
            status: self.status,
            scheduled_time: self.scheduled_time,
            progress: self.progress,
            last_error: self.last_error.clone(),
        }
    }
}
