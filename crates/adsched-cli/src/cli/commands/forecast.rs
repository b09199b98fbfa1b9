//! `adsched forecast` – observe briefly, then print hourly predictions.

use adsched_core::clock::{Clock, SystemClock};
use adsched_core::config::SchedConfig;
use adsched_core::forecast::Forecaster;
use adsched_core::service::SchedulingService;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::format_rate;

pub async fn run_forecast(cfg: &SchedConfig, hours: u32, warmup: u64) -> Result<()> {
    let clock = Arc::new(SystemClock);
    let service = SchedulingService::from_config(cfg, clock.clone());
    let forecaster = service.forecaster();

    let path = Forecaster::default_history_path()?;
    match forecaster.load_from_path(&path)? {
        Some(n) => tracing::info!("loaded {} history samples from {}", n, path.display()),
        None => tracing::info!("no forecast history at {}", path.display()),
    }

    if warmup > 0 {
        let stop = CancellationToken::new();
        let observing = tokio::spawn(
            Arc::clone(service.observer()).run(cfg.sample_interval(), stop.clone()),
        );
        tokio::time::sleep(Duration::from_secs(warmup)).await;
        stop.cancel();
        observing.await?;
    }
    forecaster.update_from_store();
    forecaster.save_to_path(&path)?;

    let now = clock.now();
    println!("{:<17} {:>12} {:>10} {}", "HOUR", "ESTIMATE", "CONFIDENCE", "LINK");
    for (i, p) in forecaster.hourly_predictions(now, hours).enumerate() {
        let at = now + chrono::Duration::hours(i as i64);
        println!(
            "{:<17} {:>12} {:>9.0}% {}",
            at.format("%a %Y-%m-%d %H"),
            format_rate(p.estimated_bytes_per_sec),
            p.confidence * 100.0,
            p.link.as_str()
        );
    }
    println!("history: {} samples ({})", forecaster.history_len(), path.display());
    Ok(())
}
