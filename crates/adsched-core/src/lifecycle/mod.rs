//! Task lifecycle: the contract between the scheduler and the transfer layer.
//!
//! The scheduler never owns transfer state. It drives an externally owned
//! [`TransferHandle`] (start, pause, resume, cancel, throughput cap) and
//! learns about progress and the terminal outcome by subscribing to the
//! handle's [`TransferReport`] channel.

mod progress;
mod state;
mod tracked;

use tokio::sync::watch;

pub use progress::Progress;
pub use state::{InvalidTransition, TaskState};
pub use tracked::TrackedTransfer;

/// Identifier of a transfer; also the scheduler's entry id.
pub type TaskId = String;

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Completed,
    /// Failed with a human-readable reason, kept verbatim.
    Failed(String),
    Cancelled,
}

/// Latest progress plus the terminal outcome once there is one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub progress: Progress,
    pub terminal: Option<TerminalEvent>,
}

/// Handle to one download owned by the transfer layer.
///
/// The scheduler calls every method with its own locks released, so an
/// implementation is free to do I/O in `start` or `set_throughput_cap`.
pub trait TransferHandle: Send + Sync {
    fn id(&self) -> &str;

    /// Begin (or resume) the transfer. Idempotent while already running.
    fn start(&self);

    /// Suspend without losing transferred bytes.
    fn pause(&self);

    /// Continue a paused transfer.
    fn resume(&self);

    /// Terminate the transfer and release its resources.
    fn cancel(&self);

    /// Advisory throughput cap in bytes per second; 0 means unlimited.
    fn set_throughput_cap(&self, bytes_per_sec: u64);

    /// Progress and terminal reports. The receiver starts at the current report.
    fn subscribe(&self) -> watch::Receiver<TransferReport>;
}
