//! CLI command handlers, one per file.

mod config_cmd;
mod forecast;
mod observe;
mod plan;

pub use config_cmd::run_config;
pub use forecast::run_forecast;
pub use observe::run_observe;
pub use plan::run_plan;

/// Human-readable throughput, e.g. `1.5 MB/s`.
pub(crate) fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];
    let mut value = bytes_per_sec.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
