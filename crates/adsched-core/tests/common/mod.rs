//! Shared fixtures for integration tests.

pub mod fake_proc;

use std::sync::Arc;

use adsched_core::clock::ManualClock;
use chrono::{NaiveDate, NaiveDateTime};

/// Monday 2024-06-03 at `h:m`.
pub fn monday(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn manual_clock(at: NaiveDateTime) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(at))
}

/// Let spawned scheduler tasks run to their next await point.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
