//! Caller-owned scheduling preferences.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::admission::PriorityClass;

/// When a download should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePriority {
    /// Start as soon as a slot is free.
    Immediate,
    /// Wait for the off-peak window [23:00, 06:00).
    OffPeak,
    /// Pick the most trustworthy hour in the next 24 that meets the minimum bandwidth.
    BestEffort,
}

impl SchedulePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulePriority::Immediate => "immediate",
            SchedulePriority::OffPeak => "off-peak",
            SchedulePriority::BestEffort => "best-effort",
        }
    }
}

impl fmt::Display for SchedulePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreference {
    pub priority: SchedulePriority,
    /// Bandwidth-share class once admitted (`None` = unspecified share).
    #[serde(default)]
    pub class: Option<PriorityClass>,
    /// BestEffort only considers hours forecast at or above this rate.
    #[serde(default)]
    pub min_bytes_per_sec: u64,
    /// Upper bound on the allocated cap (0 = none).
    #[serde(default)]
    pub max_bytes_per_sec: u64,
    #[serde(default)]
    pub preferred_time: Option<NaiveDateTime>,
    /// With a preferred time: search forward from it instead of pinning to it.
    #[serde(default)]
    pub allow_reschedule: bool,
}

impl SchedulePreference {
    pub fn new(priority: SchedulePriority) -> Self {
        Self {
            priority,
            class: None,
            min_bytes_per_sec: 0,
            max_bytes_per_sec: 0,
            preferred_time: None,
            allow_reschedule: false,
        }
    }

    pub fn immediate() -> Self {
        Self::new(SchedulePriority::Immediate)
    }

    pub fn off_peak() -> Self {
        Self::new(SchedulePriority::OffPeak)
    }

    pub fn best_effort(min_bytes_per_sec: u64) -> Self {
        Self {
            min_bytes_per_sec,
            ..Self::new(SchedulePriority::BestEffort)
        }
    }

    pub fn with_class(mut self, class: PriorityClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_max_bytes_per_sec(mut self, max: u64) -> Self {
        self.max_bytes_per_sec = max;
        self
    }

    pub fn with_preferred_time(mut self, at: NaiveDateTime, allow_reschedule: bool) -> Self {
        self.preferred_time = Some(at);
        self.allow_reschedule = allow_reschedule;
        self
    }
}
