//! Hour-of-day and (weekday, hour) sample buckets.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::samples::Sample;

pub(crate) const HOURS: usize = 24;
pub(crate) const WEEKDAYS: usize = 7;

/// Every bucket exists from construction; an empty bucket simply has no samples.
#[derive(Debug, Clone)]
pub(crate) struct Buckets {
    hourly: Vec<Vec<Sample>>,
    daily: Vec<Vec<Vec<Sample>>>,
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            hourly: vec![Vec::new(); HOURS],
            daily: vec![vec![Vec::new(); HOURS]; WEEKDAYS],
        }
    }
}

/// Weekday index with Sunday = 0.
pub(crate) fn weekday_index(t: &NaiveDateTime) -> usize {
    t.weekday().num_days_from_sunday() as usize
}

pub(crate) fn hour_index(t: &NaiveDateTime) -> usize {
    t.hour() as usize
}

impl Buckets {
    pub(crate) fn insert(&mut self, sample: Sample) {
        let hour = hour_index(&sample.timestamp);
        let day = weekday_index(&sample.timestamp);
        self.hourly[hour].push(sample);
        self.daily[day][hour].push(sample);
    }

    /// Remove samples older than `cutoff` from every bucket.
    pub(crate) fn prune(&mut self, cutoff: NaiveDateTime) {
        let keep = |s: &Sample| s.timestamp >= cutoff;
        for bucket in &mut self.hourly {
            bucket.retain(keep);
        }
        for day in &mut self.daily {
            for bucket in day {
                bucket.retain(keep);
            }
        }
    }

    pub(crate) fn hour(&self, hour: usize) -> &[Sample] {
        &self.hourly[hour % HOURS]
    }

    pub(crate) fn slot(&self, weekday: usize, hour: usize) -> &[Sample] {
        &self.daily[weekday % WEEKDAYS][hour % HOURS]
    }

    /// Total samples held (each counted once).
    pub(crate) fn len(&self) -> usize {
        self.hourly.iter().map(Vec::len).sum()
    }

    /// All samples, oldest first.
    pub(crate) fn all_samples(&self) -> Vec<Sample> {
        let mut all: Vec<Sample> = self.hourly.iter().flatten().copied().collect();
        all.sort_by_key(|s| s.timestamp);
        all
    }
}
