//! Per-runner counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of what a runner has done since it was set up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerStats {
    pub invocations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Invocations that skipped the cache because of side-effect tokens
    pub bypassed: u64,
    pub evaluations: u64,
    pub timeouts: u64,
    pub parse_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub invocations: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub bypassed: AtomicU64,
    pub evaluations: AtomicU64,
    pub timeouts: AtomicU64,
    pub parse_failures: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunnerStats {
        RunnerStats {
            invocations: self.invocations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_bumps() {
        let counters = Counters::default();
        Counters::bump(&counters.invocations);
        Counters::bump(&counters.invocations);
        Counters::bump(&counters.timeouts);

        let stats = counters.snapshot();
        assert_eq!(stats.invocations, 2);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.cache_hits, 0);
    }
}
