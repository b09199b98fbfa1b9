//! Interface counter abstraction.

use std::path::PathBuf;

use crate::samples::LinkType;

/// Cumulative receive counter for one active interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub link: LinkType,
}

/// Error reading interface counters. Always transient from the observer's
/// point of view: it is logged and the next tick tries again.
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed counter line: {0:?}")]
    Malformed(String),
}

/// Source of interface counters and link signal quality.
pub trait CounterSource: Send + Sync {
    /// Cumulative counters for every active interface.
    fn read_counters(&self) -> Result<Vec<InterfaceCounters>, CounterError>;

    /// Link quality in percent for the wireless link, if one is present and readable.
    fn signal_quality(&self) -> Option<u8>;
}
