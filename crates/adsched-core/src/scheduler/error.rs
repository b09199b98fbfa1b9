use crate::lifecycle::TaskId;

/// Why a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("task {0} is already scheduled")]
    Duplicate(TaskId),
    #[error("scheduler is shut down")]
    ShutDown,
}

/// Why a control request (pause, resume, priority change) could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("no schedule entry for task {0}")]
    UnknownEntry(TaskId),
    #[error("task {0} is not running")]
    NotRunning(TaskId),
    #[error("task {0} already finished")]
    Finished(TaskId),
}
