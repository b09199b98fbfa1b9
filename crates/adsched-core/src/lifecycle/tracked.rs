//! In-process [`TransferHandle`] built on the [`TaskState`] machine.
//!
//! The scheduler side drives it through the handle trait; the transfer layer
//! reports through [`TrackedTransfer::report_progress`], [`TrackedTransfer::complete`]
//! and [`TrackedTransfer::fail`].

use parking_lot::Mutex;
use tokio::sync::watch;

use super::{
    InvalidTransition, Progress, TaskId, TaskState, TerminalEvent, TransferHandle, TransferReport,
};

#[derive(Debug)]
struct Inner {
    state: TaskState,
    cap: u64,
    start_calls: u32,
    cancel_calls: u32,
}

#[derive(Debug)]
pub struct TrackedTransfer {
    id: TaskId,
    inner: Mutex<Inner>,
    reports: watch::Sender<TransferReport>,
}

impl TrackedTransfer {
    pub fn new(id: impl Into<TaskId>) -> Self {
        let (reports, _) = watch::channel(TransferReport::default());
        Self {
            id: id.into(),
            inner: Mutex::new(Inner {
                state: TaskState::Queued,
                cap: 0,
                start_calls: 0,
                cancel_calls: 0,
            }),
            reports,
        }
    }

    pub fn state(&self) -> TaskState {
        self.inner.lock().state
    }

    /// Current throughput cap (0 = unlimited).
    pub fn cap(&self) -> u64 {
        self.inner.lock().cap
    }

    /// How many times `start` was called through the handle.
    pub fn start_calls(&self) -> u32 {
        self.inner.lock().start_calls
    }

    /// How many times `cancel` was called through the handle.
    pub fn cancel_calls(&self) -> u32 {
        self.inner.lock().cancel_calls
    }

    pub fn report(&self) -> TransferReport {
        self.reports.borrow().clone()
    }

    /// Mark the transfer as waiting for its scheduled time.
    pub fn mark_scheduled(&self) -> Result<(), InvalidTransition> {
        let mut inner = self.inner.lock();
        inner.state = inner.state.transition(TaskState::Scheduled)?;
        Ok(())
    }

    /// Publish transfer progress. Ignored once the transfer is terminal.
    pub fn report_progress(&self, bytes_done: u64, total_bytes: Option<u64>) {
        let inner = self.inner.lock();
        if inner.state.is_terminal() {
            return;
        }
        self.reports
            .send_modify(|r| r.progress = Progress::new(bytes_done, total_bytes));
    }

    /// The transfer finished successfully.
    pub fn complete(&self) -> Result<(), InvalidTransition> {
        self.finish(TaskState::Completed, TerminalEvent::Completed)
    }

    /// The transfer failed with `reason`.
    pub fn fail(&self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.finish(TaskState::Failed, TerminalEvent::Failed(reason.into()))
    }

    fn finish(&self, to: TaskState, event: TerminalEvent) -> Result<(), InvalidTransition> {
        let mut inner = self.inner.lock();
        inner.state = inner.state.transition(to)?;
        self.reports.send_modify(|r| r.terminal = Some(event));
        tracing::debug!(task = %self.id, state = %to, "transfer finished");
        Ok(())
    }

    fn move_to(&self, to: TaskState) {
        let mut inner = self.inner.lock();
        match inner.state.transition(to) {
            Ok(next) => inner.state = next,
            Err(e) => tracing::debug!(task = %self.id, "ignored: {}", e),
        }
    }
}

impl TransferHandle for TrackedTransfer {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&self) {
        let mut inner = self.inner.lock();
        inner.start_calls += 1;
        if inner.state == TaskState::Downloading {
            return;
        }
        match inner.state.transition(TaskState::Downloading) {
            Ok(next) => inner.state = next,
            Err(e) => tracing::debug!(task = %self.id, "start ignored: {}", e),
        }
    }

    fn pause(&self) {
        self.move_to(TaskState::Paused);
    }

    fn resume(&self) {
        self.move_to(TaskState::Downloading);
    }

    fn cancel(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_calls += 1;
        if inner.state.is_terminal() {
            return;
        }
        inner.state = TaskState::Cancelled;
        self.reports
            .send_modify(|r| r.terminal = Some(TerminalEvent::Cancelled));
    }

    fn set_throughput_cap(&self, bytes_per_sec: u64) {
        self.inner.lock().cap = bytes_per_sec;
    }

    fn subscribe(&self) -> watch::Receiver<TransferReport> {
        self.reports.subscribe()
    }
}
