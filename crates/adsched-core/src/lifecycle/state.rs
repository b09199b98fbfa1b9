//! Per-download state machine.
//!
//! ```text
//! Queued ──► Scheduled ──► Downloading ◄──► Paused
//!    │           │              │              │
//!    └───────────┴──────────────┴──────────────┴──► Completed | Failed | Cancelled
//! ```
//! Only `Downloading` can complete. Terminal states are absorbing.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Queued,
    Scheduled,
    Downloading,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid task transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TaskState,
    pub to: TaskState,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Scheduled => "scheduled",
            TaskState::Downloading => "downloading",
            TaskState::Paused => "paused",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    pub fn can_transition(self, to: TaskState) -> bool {
        use TaskState::*;
        match (self, to) {
            (from, _) if from.is_terminal() => false,
            (Queued, Scheduled) | (Queued, Downloading) | (Scheduled, Downloading) => true,
            (Downloading, Paused) | (Paused, Downloading) => true,
            (Downloading, Completed) => true,
            (_, Failed) | (_, Cancelled) => true,
            _ => false,
        }
    }

    /// Move to `to`, or report why that is not allowed.
    pub fn transition(self, to: TaskState) -> Result<TaskState, InvalidTransition> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
