//! Sampler run counters and per-run statistics.
//! Plain atomics; `snapshot()` is what an operator surface serializes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Process-lifetime sampler counters.
#[derive(Default)]
pub struct SamplerMetrics {
    successful_runs: AtomicU64,
    failed_runs: AtomicU64,
    stopped_runs: AtomicU64,
}

impl SamplerMetrics {
    pub fn inc_successful_runs(&self) {
        self.successful_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_runs(&self) {
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stopped_runs(&self) {
        self.stopped_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SamplerMetricsSnapshot {
        SamplerMetricsSnapshot {
            successful_runs: self.successful_runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            stopped_runs: self.stopped_runs.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the sampler counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplerMetricsSnapshot {
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub stopped_runs: u64,
}

/// Statistics of a single sampler run. Updated concurrently by the
/// pipeline stages, reported once in the completion log line.
#[derive(Default)]
pub struct SampleStats {
    total_iterated: AtomicU64,
    not_found: AtomicU64,
    new_ignored: AtomicU64,
    invalid_stamp: AtomicU64,
    invalid_chunk: AtomicU64,
    iteration_nanos: AtomicU64,
    get_nanos: AtomicU64,
    hash_nanos: AtomicU64,
    validation_nanos: AtomicU64,
}

impl SampleStats {
    pub fn inc_iterated(&self) {
        self.total_iterated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_new_ignored(&self) {
        self.new_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_stamp(&self) {
        self.invalid_stamp.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_chunk(&self) {
        self.invalid_chunk.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_iteration_duration(&self, d: Duration) {
        self.iteration_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn add_get_duration(&self, d: Duration) {
        self.get_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn add_hash_duration(&self, d: Duration) {
        self.hash_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn add_validation_duration(&self, d: Duration) {
        self.validation_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn total_iterated(&self) -> u64 {
        self.total_iterated.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    pub fn new_ignored(&self) -> u64 {
        self.new_ignored.load(Ordering::Relaxed)
    }

    pub fn invalid_stamp(&self) -> u64 {
        self.invalid_stamp.load(Ordering::Relaxed)
    }

    pub fn invalid_chunk(&self) -> u64 {
        self.invalid_chunk.load(Ordering::Relaxed)
    }
}

impl fmt::Display for SampleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunks: {} not_found: {} new_ignored: {} invalid_stamp: {} invalid_chunk: {} \
             iteration: {:?} get: {:?} hash: {:?} validation: {:?}",
            self.total_iterated(),
            self.not_found(),
            self.new_ignored(),
            self.invalid_stamp(),
            self.invalid_chunk(),
            Duration::from_nanos(self.iteration_nanos.load(Ordering::Relaxed)),
            Duration::from_nanos(self.get_nanos.load(Ordering::Relaxed)),
            Duration::from_nanos(self.hash_nanos.load(Ordering::Relaxed)),
            Duration::from_nanos(self.validation_nanos.load(Ordering::Relaxed)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counters() {
        let metrics = SamplerMetrics::default();
        metrics.inc_successful_runs();
        metrics.inc_successful_runs();
        metrics.inc_failed_runs();
        metrics.inc_stopped_runs();
        assert_eq!(
            metrics.snapshot(),
            SamplerMetricsSnapshot {
                successful_runs: 2,
                failed_runs: 1,
                stopped_runs: 1,
            }
        );
    }

    #[test]
    fn test_stats_display_mentions_counts() {
        let stats = SampleStats::default();
        stats.inc_iterated();
        stats.inc_iterated();
        stats.inc_not_found();
        stats.add_get_duration(Duration::from_millis(5));
        let line = stats.to_string();
        assert!(line.contains("chunks: 2"));
        assert!(line.contains("not_found: 1"));
    }
}
