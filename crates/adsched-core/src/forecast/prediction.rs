//! Forecast output types.

use std::iter::FusedIterator;

use chrono::{Duration, NaiveDateTime};

use crate::samples::LinkType;

use super::Forecaster;

/// Bandwidth estimate for one target hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Hour of day (0–23) of the target time.
    pub hour: u32,
    /// Estimated available bandwidth in bytes per second.
    pub estimated_bytes_per_sec: f64,
    /// Agreement of the contributing estimates, in `[0, 1]`.
    pub confidence: f64,
    pub link: LinkType,
}

/// Lazy sequence of predictions at hourly offsets from a start time.
///
/// Each item is computed when pulled, from the forecaster's state at that
/// moment. Clone the iterator to restart it.
#[derive(Clone)]
pub struct HourlyPredictions<'a> {
    forecaster: &'a Forecaster,
    start: NaiveDateTime,
    next: u32,
    count: u32,
}

impl<'a> HourlyPredictions<'a> {
    pub(crate) fn new(forecaster: &'a Forecaster, start: NaiveDateTime, count: u32) -> Self {
        Self {
            forecaster,
            start,
            next: 0,
            count,
        }
    }
}

impl Iterator for HourlyPredictions<'_> {
    type Item = Prediction;

    fn next(&mut self) -> Option<Prediction> {
        if self.next >= self.count {
            return None;
        }
        let at = self.start + Duration::hours(i64::from(self.next));
        self.next += 1;
        Some(self.forecaster.predict(at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for HourlyPredictions<'_> {}

impl FusedIterator for HourlyPredictions<'_> {}
