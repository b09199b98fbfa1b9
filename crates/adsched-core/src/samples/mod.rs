//! Network throughput samples and the fixed-capacity store that holds them.
//!
//! The observer is the single producer; the forecaster and the scheduler read
//! recent windows from the store.

mod ring;
mod store;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use ring::RingBuffer;
pub use store::{SampleStore, Usage};

/// Dominant link type of the active interfaces at sampling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Mobile,
}

impl LinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Unknown => "unknown",
            LinkType::Ethernet => "ethernet",
            LinkType::Wifi => "wifi",
            LinkType::Mobile => "mobile",
        }
    }
}

/// One throughput observation. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub bytes_per_sec: u64,
    pub link: LinkType,
    /// Link quality in percent, when the interface exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<u8>,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, bytes_per_sec: u64, link: LinkType) -> Self {
        Self {
            timestamp,
            bytes_per_sec,
            link,
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: Option<u8>) -> Self {
        self.signal = signal;
        self
    }
}
