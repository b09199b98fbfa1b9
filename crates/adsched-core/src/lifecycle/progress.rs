//! Transfer progress as reported by a task handle.

/// Bytes transferred so far and the total, when the transfer layer knows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub bytes_done: u64,
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn new(bytes_done: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_done,
            total_bytes,
        }
    }

    /// Fraction complete in [0.0, 1.0], or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }

    /// Bytes left to transfer, when the total is known.
    pub fn remaining(&self) -> Option<u64> {
        self.total_bytes
            .map(|total| total.saturating_sub(self.bytes_done))
    }
}
