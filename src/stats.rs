//! Cumulative per-domain availability statistics

use crate::domain::DomainKey;
use std::collections::HashMap;
use tracing::debug;

/// Probe counters for one domain; `up <= total` always holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    pub up: u64,
    pub total: u64,
}

impl DomainStats {
    /// Percentage of probes classified UP
    pub fn availability(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.up as f64 / self.total as f64) * 100.0
    }
}

/// One line of the end-of-cycle report
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAvailability {
    pub domain: DomainKey,
    pub up: u64,
    pub total: u64,
    pub availability: f64,
}

/// Domain counters kept for the whole process lifetime, in first-seen order.
///
/// Entries are never reset or removed.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    index: HashMap<DomainKey, usize>,
    entries: Vec<(DomainKey, DomainStats)>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one probe against `domain`
    pub fn record(&mut self, domain: DomainKey, is_up: bool) {
        let slot = match self.index.get(&domain) {
            Some(&slot) => slot,
            None => {
                debug!("Tracking new domain: {}", domain);
                self.entries.push((domain.clone(), DomainStats::default()));
                self.index.insert(domain, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let stats = &mut self.entries[slot].1;
        stats.total += 1;
        if is_up {
            stats.up += 1;
        }
    }

    /// Availability of every domain seen so far, computed now
    pub fn report(&self) -> Vec<DomainAvailability> {
        self.entries
            .iter()
            .map(|(domain, stats)| DomainAvailability {
                domain: domain.clone(),
                up: stats.up,
                total: stats.total,
                availability: stats.availability(),
            })
            .collect()
    }

    pub fn get(&self, domain: &DomainKey) -> Option<DomainStats> {
        self.index.get(domain).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> DomainKey {
        DomainKey::Host(name.to_string())
    }

    #[test]
    fn test_record_initialises_lazily() {
        let mut stats = StatsAggregator::new();
        assert!(stats.is_empty());
        assert_eq!(stats.get(&key("example.com")), None);

        stats.record(key("example.com"), false);
        assert_eq!(
            stats.get(&key("example.com")),
            Some(DomainStats { up: 0, total: 1 })
        );
    }

    #[test]
    fn test_shared_domain_across_cycles() {
        let mut stats = StatsAggregator::new();

        // cycle 1: one up, one down
        stats.record(key("example.com"), true);
        stats.record(key("example.com"), false);
        let report = stats.report();
        assert_eq!(report.len(), 1);
        assert_eq!(format!("{:.2}", report[0].availability), "50.00");

        // cycle 2: both up
        stats.record(key("example.com"), true);
        stats.record(key("example.com"), true);
        let report = stats.report();
        assert_eq!(report[0].up, 3);
        assert_eq!(report[0].total, 4);
        assert_eq!(format!("{:.2}", report[0].availability), "75.00");
    }

    #[test]
    fn test_report_keeps_insertion_order() {
        let mut stats = StatsAggregator::new();
        for name in ["zeta.io", "alpha.io", "mid.io", "alpha.io"] {
            stats.record(key(name), true);
        }
        stats.record(DomainKey::NoHost, false);

        let order: Vec<String> = stats.report().iter().map(|r| r.domain.to_string()).collect();
        assert_eq!(order, vec!["zeta.io", "alpha.io", "mid.io", "<no host>"]);
    }

    #[test]
    fn test_counters_are_bounded_and_monotonic() {
        let mut stats = StatsAggregator::new();
        let mut previous = DomainStats::default();

        for i in 0..50 {
            stats.record(key("flaky.example"), i % 3 == 0);
            let current = stats.get(&key("flaky.example")).unwrap();

            assert!(current.up <= current.total);
            assert!(current.up >= previous.up);
            assert_eq!(current.total, previous.total + 1);
            assert!((0.0..=100.0).contains(&current.availability()));
            previous = current;
        }
        assert_eq!(stats.len(), 1);
    }
}
