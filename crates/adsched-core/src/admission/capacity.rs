//! Sources of the total capacity estimate that the allocator partitions.

use std::sync::Arc;

use crate::clock::Clock;
use crate::forecast::Forecaster;

/// Total bandwidth currently available to admitted transfers, in bytes/sec.
pub trait CapacityEstimate: Send + Sync {
    fn total_bytes_per_sec(&self) -> f64;
}

/// Constant capacity.
#[derive(Debug, Clone, Copy)]
pub struct FixedCapacity(pub f64);

impl CapacityEstimate for FixedCapacity {
    fn total_bytes_per_sec(&self) -> f64 {
        self.0
    }
}

/// Forecast for the current hour, or `fallback` while the forecaster has nothing.
pub struct ForecastCapacity {
    forecaster: Arc<Forecaster>,
    clock: Arc<dyn Clock>,
    fallback: f64,
}

impl ForecastCapacity {
    pub fn new(forecaster: Arc<Forecaster>, clock: Arc<dyn Clock>, fallback: f64) -> Self {
        Self {
            forecaster,
            clock,
            fallback,
        }
    }
}

impl CapacityEstimate for ForecastCapacity {
    fn total_bytes_per_sec(&self) -> f64 {
        let estimate = self
            .forecaster
            .predict(self.clock.now())
            .estimated_bytes_per_sec;
        if estimate > 0.0 {
            estimate
        } else {
            self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::forecast::ForecastWeights;
    use crate::samples::{LinkType, Sample, SampleStore};
    use chrono::NaiveDate;

    #[test]
    fn falls_back_until_forecast_has_data() {
        let now = NaiveDate::from_ymd_opt(2024, 2, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(SampleStore::new(10));
        let forecaster = Arc::new(Forecaster::new(
            store.clone(),
            clock.clone(),
            ForecastWeights::default(),
            chrono::Duration::days(30),
            10,
        ));
        let cap = ForecastCapacity::new(forecaster, clock, 10_485_760.0);
        assert_eq!(cap.total_bytes_per_sec(), 10_485_760.0);

        store.add(Sample::new(now, 3_000_000, LinkType::Ethernet));
        assert_eq!(cap.total_bytes_per_sec(), 3_000_000.0);
    }
}
