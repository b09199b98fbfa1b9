//! `adsched plan` – show when a download submitted now would be scheduled.

use adsched_core::clock::{Clock, ManualClock, SystemClock};
use adsched_core::config::SchedConfig;
use adsched_core::forecast::Forecaster;
use adsched_core::lifecycle::TrackedTransfer;
use adsched_core::scheduler::{SchedulePreference, SchedulePriority};
use adsched_core::service::SchedulingService;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::sync::Arc;

use super::format_rate;

pub fn run_plan(
    cfg: &SchedConfig,
    priority: SchedulePriority,
    min_bps: u64,
    at: Option<NaiveDateTime>,
) -> Result<()> {
    // `--at` pins "now" so a plan can be previewed for another time of day.
    let clock: Arc<dyn Clock> = match at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let service = SchedulingService::from_config(cfg, clock.clone());
    let path = Forecaster::default_history_path()?;
    if service.forecaster().load_from_path(&path)?.is_none() {
        println!("no forecast history yet; run `adsched forecast` to collect some");
    }

    let preference = SchedulePreference {
        min_bytes_per_sec: min_bps,
        ..SchedulePreference::new(priority)
    };
    let scheduler = service.scheduler();
    let task_id = scheduler.submit(Arc::new(TrackedTransfer::new("plan")), preference)?;
    let info = scheduler
        .status(&task_id)
        .context("planned entry disappeared")?;

    let now = clock.now();
    let wait = (info.scheduled_time - now).num_minutes().max(0);
    let predicted = scheduler.predict_bandwidth(info.scheduled_time);
    println!("priority:  {}", priority);
    println!(
        "scheduled: {} (in {}h {:02}m)",
        info.scheduled_time.format("%Y-%m-%d %H:%M"),
        wait / 60,
        wait % 60
    );
    println!(
        "forecast:  {} at {:.0}% confidence",
        format_rate(predicted.estimated_bytes_per_sec),
        predicted.confidence * 100.0
    );
    Ok(())
}
