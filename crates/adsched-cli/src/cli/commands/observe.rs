//! `adsched observe` – sample network throughput and print each sample.

use adsched_core::clock::SystemClock;
use adsched_core::config::SchedConfig;
use adsched_core::service::SchedulingService;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::format_rate;

pub async fn run_observe(cfg: &SchedConfig, secs: u64) -> Result<()> {
    let service = SchedulingService::from_config(cfg, Arc::new(SystemClock));
    let observer = service.observer();
    observer.prime();

    let mut ticker = tokio::time::interval(cfg.sample_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(secs);

    println!("{:<20} {:>12} {:<9} {}", "TIME", "RATE", "LINK", "SIGNAL");
    while tokio::time::Instant::now() < deadline {
        ticker.tick().await;
        let Some(sample) = observer.sample_once() else {
            continue;
        };
        let signal = sample
            .signal
            .map(|s| format!("{s}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:>12} {:<9} {}",
            sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_rate(sample.bytes_per_sec as f64),
            sample.link.as_str(),
            signal
        );
    }

    let usage = service.store().current_usage(cfg.recent_window);
    println!(
        "average of last {} samples: {}",
        usage.samples,
        format_rate(usage.average_bytes_per_sec)
    );
    Ok(())
}
