//! Priority-class bandwidth partitioning.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Bandwidth-share class of an admitted task. A task may also have no class
/// (`None`), which gets the "unspecified" share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    High,
    Medium,
    Low,
}

impl PriorityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PriorityClass::High => "high",
            PriorityClass::Medium => "medium",
            PriorityClass::Low => "low",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fraction of total capacity given to each class. Shares of absent classes
/// are left unallocated; they need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassShares {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub unspecified: f64,
}

impl Default for ClassShares {
    fn default() -> Self {
        Self {
            high: 0.5,
            medium: 0.3,
            low: 0.2,
            unspecified: 0.1,
        }
    }
}

impl ClassShares {
    pub fn share(&self, class: Option<PriorityClass>) -> f64 {
        match class {
            Some(PriorityClass::High) => self.high,
            Some(PriorityClass::Medium) => self.medium,
            Some(PriorityClass::Low) => self.low,
            None => self.unspecified,
        }
    }
}

/// One admitted task as seen by the allocator.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub id: &'a str,
    pub class: Option<PriorityClass>,
    /// Per-task upper bound from the schedule preference (0 = none).
    pub max_bytes_per_sec: u64,
}

/// Computes per-task caps: capacity × class share ÷ members in that class.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandwidthAllocator {
    shares: ClassShares,
}

impl BandwidthAllocator {
    pub fn new(shares: ClassShares) -> Self {
        Self { shares }
    }

    pub fn shares(&self) -> ClassShares {
        self.shares
    }

    /// Cap for every member, in input order. A non-positive capacity yields
    /// 0 (unlimited) for everyone: there is nothing to partition.
    pub fn allocate(
        &self,
        capacity_bytes_per_sec: f64,
        members: &[Member<'_>],
    ) -> Vec<(String, u64)> {
        let mut per_class: HashMap<Option<PriorityClass>, usize> = HashMap::new();
        for m in members {
            *per_class.entry(m.class).or_default() += 1;
        }
        members
            .iter()
            .map(|m| {
                let cap = if capacity_bytes_per_sec > 0.0 {
                    let n = per_class[&m.class] as f64;
                    let share = capacity_bytes_per_sec * self.shares.share(m.class) / n;
                    let cap = (share.round() as u64).max(1);
                    if m.max_bytes_per_sec > 0 {
                        cap.min(m.max_bytes_per_sec)
                    } else {
                        cap
                    }
                } else {
                    0
                };
                (m.id.to_string(), cap)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, class: Option<PriorityClass>) -> Member<'_> {
        Member {
            id,
            class,
            max_bytes_per_sec: 0,
        }
    }

    #[test]
    fn high_medium_medium_on_nine_megabytes() {
        let alloc = BandwidthAllocator::default();
        let caps = alloc.allocate(
            9_000_000.0,
            &[
                member("h", Some(PriorityClass::High)),
                member("m1", Some(PriorityClass::Medium)),
                member("m2", Some(PriorityClass::Medium)),
            ],
        );
        assert_eq!(
            caps,
            vec![
                ("h".to_string(), 4_500_000),
                ("m1".to_string(), 1_350_000),
                ("m2".to_string(), 1_350_000),
            ]
        );
    }

    #[test]
    fn absent_classes_leave_share_unallocated() {
        let alloc = BandwidthAllocator::default();
        let caps = alloc.allocate(
            10_000_000.0,
            &[member("l", Some(PriorityClass::Low)), member("u", None)],
        );
        assert_eq!(caps[0].1, 2_000_000);
        assert_eq!(caps[1].1, 1_000_000);
    }

    #[test]
    fn max_bound_clamps_cap() {
        let alloc = BandwidthAllocator::default();
        let caps = alloc.allocate(
            10_000_000.0,
            &[Member {
                id: "h",
                class: Some(PriorityClass::High),
                max_bytes_per_sec: 1_000,
            }],
        );
        assert_eq!(caps[0].1, 1_000);
    }

    #[test]
    fn zero_capacity_means_unlimited() {
        let alloc = BandwidthAllocator::default();
        let caps = alloc.allocate(0.0, &[member("h", Some(PriorityClass::High))]);
        assert_eq!(caps[0].1, 0);
    }

    #[test]
    fn custom_shares() {
        let alloc = BandwidthAllocator::new(ClassShares {
            high: 0.8,
            medium: 0.1,
            low: 0.1,
            unspecified: 0.0,
        });
        let caps = alloc.allocate(1_000.0, &[member("h", Some(PriorityClass::High))]);
        assert_eq!(caps[0].1, 800);
    }
}
