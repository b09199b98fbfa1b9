//! Shared sample store: a ring buffer behind its own lock.

use chrono::NaiveDateTime;
use parking_lot::Mutex;

use super::{LinkType, RingBuffer, Sample};

/// Live usage over the most recent samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    /// Mean bytes/sec over the window (0 when no samples).
    pub average_bytes_per_sec: f64,
    /// Link type of the newest sample.
    pub link: LinkType,
    /// Signal of the newest sample, if any.
    pub signal: Option<u8>,
    /// Number of samples that contributed.
    pub samples: usize,
}

/// Thread-safe store of recent throughput samples.
///
/// Every method takes the lock for a short, I/O-free section and returns
/// owned data, so readers never hold the lock across other work.
#[derive(Debug)]
pub struct SampleStore {
    ring: Mutex<RingBuffer<Sample>>,
}

impl SampleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    /// Record a sample. Samples older than the newest stored one are rejected
    /// (returns false) so the store stays in non-decreasing timestamp order.
    pub fn add(&self, sample: Sample) -> bool {
        let mut ring = self.ring.lock();
        if let Some(newest) = ring.newest() {
            if sample.timestamp < newest.timestamp {
                tracing::debug!(
                    at = %sample.timestamp,
                    newest = %newest.timestamp,
                    "dropping out-of-order sample"
                );
                return false;
            }
        }
        ring.push(sample);
        true
    }

    /// Append a sample, moving its timestamp up to the newest stored one when
    /// the wall clock has stepped back. Returns the sample as stored.
    pub fn record(&self, mut sample: Sample) -> Sample {
        let mut ring = self.ring.lock();
        if let Some(newest) = ring.newest() {
            if sample.timestamp < newest.timestamp {
                tracing::debug!(
                    at = %sample.timestamp,
                    newest = %newest.timestamp,
                    "wall clock went backwards; holding sample at newest timestamp"
                );
                sample.timestamp = newest.timestamp;
            }
        }
        ring.push(sample);
        sample
    }

    /// The `k` most recent samples, oldest first.
    pub fn last_n(&self, k: usize) -> Vec<Sample> {
        self.ring.lock().last_n(k).copied().collect()
    }

    /// Samples matching `predicate`, oldest first.
    ///
    /// The lazy ring view borrows the buffer, so it cannot outlive the lock.
    /// This copies the matches out instead and releases the lock before the
    /// caller touches them.
    pub fn filter<P>(&self, predicate: P) -> Vec<Sample>
    where
        P: Fn(&Sample) -> bool + Clone,
    {
        self.ring.lock().filter(predicate).copied().collect()
    }

    /// Samples recorded at or after `cutoff`.
    pub fn since(&self, cutoff: NaiveDateTime) -> Vec<Sample> {
        self.filter(move |s| s.timestamp >= cutoff)
    }

    /// Samples strictly newer than `watermark`.
    pub fn newer_than(&self, watermark: NaiveDateTime) -> Vec<Sample> {
        self.filter(move |s| s.timestamp > watermark)
    }

    /// Drop samples older than `cutoff`; returns how many were evicted.
    pub fn prune_older_than(&self, cutoff: NaiveDateTime) -> usize {
        self.ring
            .lock()
            .evict_front_while(|s| s.timestamp < cutoff)
    }

    /// Average throughput over the last `window` samples.
    pub fn current_usage(&self, window: usize) -> Usage {
        let recent = self.last_n(window);
        let Some(newest) = recent.last() else {
            return Usage {
                average_bytes_per_sec: 0.0,
                link: LinkType::Unknown,
                signal: None,
                samples: 0,
            };
        };
        let total: f64 = recent.iter().map(|s| s.bytes_per_sec as f64).sum();
        Usage {
            average_bytes_per_sec: total / recent.len() as f64,
            link: newest.link,
            signal: newest.signal,
            samples: recent.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample(offset_secs: i64, bps: u64) -> Sample {
        Sample::new(t0() + Duration::seconds(offset_secs), bps, LinkType::Ethernet)
    }

    #[test]
    fn last_n_after_wrap_is_chronological() {
        let store = SampleStore::new(4);
        for i in 0..10 {
            assert!(store.add(sample(i, i as u64 * 100)));
        }
        let last = store.last_n(4);
        let bps: Vec<u64> = last.iter().map(|s| s.bytes_per_sec).collect();
        assert_eq!(bps, vec![600, 700, 800, 900]);
    }

    #[test]
    fn out_of_order_sample_is_rejected() {
        let store = SampleStore::new(4);
        assert!(store.add(sample(10, 1)));
        assert!(!store.add(sample(5, 2)));
        assert!(store.add(sample(10, 3)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn record_holds_a_stepped_back_sample_at_the_newest_timestamp() {
        let store = SampleStore::new(4);
        store.record(sample(600, 1));
        let held = store.record(sample(60, 2));
        assert_eq!(held.timestamp, t0() + Duration::seconds(600));
        assert_eq!(held.bytes_per_sec, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.record(sample(700, 3)).timestamp, t0() + Duration::seconds(700));
    }

    #[test]
    fn current_usage_averages_window() {
        let store = SampleStore::new(100);
        for i in 0..20 {
            store.add(sample(i, if i < 10 { 0 } else { 1_000 }));
        }
        let usage = store.current_usage(10);
        assert_eq!(usage.samples, 10);
        assert!((usage.average_bytes_per_sec - 1_000.0).abs() < 1e-9);
        assert_eq!(usage.link, LinkType::Ethernet);
    }

    #[test]
    fn current_usage_on_empty_store_is_zero() {
        let store = SampleStore::new(10);
        let usage = store.current_usage(10);
        assert_eq!(usage.samples, 0);
        assert_eq!(usage.average_bytes_per_sec, 0.0);
        assert_eq!(usage.link, LinkType::Unknown);
    }

    #[test]
    fn since_and_prune() {
        let store = SampleStore::new(100);
        for i in 0..10 {
            store.add(sample(i * 60, 1));
        }
        let cutoff = t0() + Duration::minutes(5);
        assert_eq!(store.since(cutoff).len(), 5);
        assert_eq!(store.newer_than(cutoff).len(), 4);
        assert_eq!(store.prune_older_than(cutoff), 5);
        assert_eq!(store.len(), 5);
    }
}
