//! Scheduled-time rules for each preference.

use chrono::{Duration, DurationRound, NaiveDateTime, Timelike};

use crate::forecast::Forecaster;

use super::preference::{SchedulePreference, SchedulePriority};

/// Off-peak window start hour (inclusive).
pub const OFF_PEAK_START_HOUR: u32 = 23;
/// Off-peak window end hour (exclusive).
pub const OFF_PEAK_END_HOUR: u32 = 6;
/// How far ahead BestEffort looks.
pub const BEST_EFFORT_HORIZON_HOURS: u32 = 24;

pub fn in_off_peak(t: NaiveDateTime) -> bool {
    t.hour() >= OFF_PEAK_START_HOUR || t.hour() < OFF_PEAK_END_HOUR
}

/// `now` inside the off-peak window, otherwise today's window start.
pub fn next_off_peak(now: NaiveDateTime) -> NaiveDateTime {
    if in_off_peak(now) {
        return now;
    }
    now.date()
        .and_hms_opt(OFF_PEAK_START_HOUR, 0, 0)
        .unwrap_or(now)
}

/// Start of the hour (within `HourlyPredictions` from `start`) whose forecast
/// meets the minimum and has the highest confidence; earliest wins ties.
/// Offset 0 maps to `start` itself. `None` when no hour qualifies.
pub fn best_forecast_hour(
    forecaster: &Forecaster,
    start: NaiveDateTime,
    min_bytes_per_sec: u64,
) -> Option<NaiveDateTime> {
    let min = min_bytes_per_sec as f64;
    let mut best: Option<(u32, f64)> = None;
    for (i, p) in forecaster
        .hourly_predictions(start, BEST_EFFORT_HORIZON_HOURS)
        .enumerate()
    {
        if p.estimated_bytes_per_sec < min {
            continue;
        }
        if best.map_or(true, |(_, c)| p.confidence > c) {
            best = Some((i as u32, p.confidence));
        }
    }
    let (offset, _) = best?;
    if offset == 0 {
        return Some(start);
    }
    let hour_start = start.duration_trunc(Duration::hours(1)).unwrap_or(start);
    Some(hour_start + Duration::hours(i64::from(offset)))
}

/// Compute the scheduled time for a submission at `now`.
pub fn scheduled_time(
    preference: &SchedulePreference,
    now: NaiveDateTime,
    forecaster: &Forecaster,
) -> NaiveDateTime {
    if preference.priority == SchedulePriority::Immediate {
        return now;
    }
    if let Some(preferred) = preference.preferred_time {
        if !preference.allow_reschedule {
            return preferred.max(now);
        }
    }
    match preference.priority {
        SchedulePriority::Immediate => now,
        SchedulePriority::OffPeak => {
            next_off_peak(preference.preferred_time.unwrap_or(now).max(now))
        }
        SchedulePriority::BestEffort => {
            let start = preference.preferred_time.unwrap_or(now).max(now);
            best_forecast_hour(forecaster, start, preference.min_bytes_per_sec).unwrap_or(start)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn off_peak_window_edges() {
        assert!(in_off_peak(at(23, 0)));
        assert!(in_off_peak(at(0, 30)));
        assert!(in_off_peak(at(5, 59)));
        assert!(!in_off_peak(at(6, 0)));
        assert!(!in_off_peak(at(22, 59)));
    }

    #[test]
    fn next_off_peak_from_afternoon_is_same_day_23() {
        assert_eq!(next_off_peak(at(14, 0)), at(23, 0));
        assert_eq!(next_off_peak(at(6, 0)), at(23, 0));
        assert_eq!(next_off_peak(at(23, 30)), at(23, 30));
        assert_eq!(next_off_peak(at(2, 15)), at(2, 15));
    }
}
