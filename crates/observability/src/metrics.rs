//! Fan-out writer metrics
//!
//! Records writer counters through the `metrics` facade and aggregates a
//! per-run summary in memory.

use std::collections::HashMap;

use contracts::{RemovalReason, WriterStats};
use metrics::{counter, gauge, histogram};

/// Record a writer stats snapshot
///
/// Counters are set to the snapshot's absolute values, so this can be called
/// as often as convenient.
pub fn record_writer_stats(stats: &WriterStats) {
    gauge!("fanout_members").set(stats.members as f64);
    gauge!("fanout_closed").set(if stats.closed { 1.0 } else { 0.0 });

    counter!("fanout_members_added_total").absolute(stats.added);
    counter!("fanout_writes_total").absolute(stats.writes);
    counter!("fanout_bytes_total").absolute(stats.bytes);

    for reason in [
        RemovalReason::Failed,
        RemovalReason::Removed,
        RemovalReason::Closed,
    ] {
        counter!("fanout_members_removed_total", "reason" => reason.as_str())
            .absolute(stats.removed(reason));
    }
}

/// Record one broadcast write
pub fn record_broadcast(bytes: usize, members: usize) {
    histogram!("fanout_broadcast_bytes").record(bytes as f64);
    histogram!("fanout_broadcast_members").record(members as f64);
}

/// Record a sink joining the writer
pub fn record_member_added(sink_name: &str) {
    counter!("fanout_sink_added_total", "sink" => sink_name.to_string()).increment(1);
}

/// Record a sink leaving the writer
pub fn record_member_removed(sink_name: &str, reason: RemovalReason) {
    counter!(
        "fanout_sink_removed_total",
        "sink" => sink_name.to_string(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Per-run broadcast aggregator
///
/// Aggregates in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct BroadcastAggregator {
    /// Broadcast writes
    pub total_writes: u64,

    /// Bytes broadcast (once per write)
    pub total_bytes: u64,

    /// Chunk size statistics
    pub chunk_stats: RunningStats,

    /// Member count per write
    pub member_stats: RunningStats,

    /// Removals per sink, with reason
    pub removals: HashMap<String, RemovalReason>,
}

impl BroadcastAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one broadcast
    pub fn update(&mut self, bytes: usize, members: usize) {
        self.total_writes += 1;
        self.total_bytes += bytes as u64;
        self.chunk_stats.push(bytes as f64);
        self.member_stats.push(members as f64);
    }

    /// Account for one sink leaving
    pub fn record_removal(&mut self, sink_name: &str, reason: RemovalReason) {
        self.removals.insert(sink_name.to_string(), reason);
    }

    /// Build summary
    pub fn summary(&self) -> BroadcastSummary {
        let failed_sinks = self
            .removals
            .iter()
            .filter(|(_, reason)| **reason == RemovalReason::Failed)
            .count();

        BroadcastSummary {
            total_writes: self.total_writes,
            total_bytes: self.total_bytes,
            failed_sinks,
            chunk_bytes: StatsSummary::from(&self.chunk_stats),
            members: StatsSummary::from(&self.member_stats),
            removals: self.removals.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Broadcast summary
#[derive(Debug, Clone, Default)]
pub struct BroadcastSummary {
    pub total_writes: u64,
    pub total_bytes: u64,
    pub failed_sinks: usize,
    pub chunk_bytes: StatsSummary,
    pub members: StatsSummary,
    pub removals: HashMap<String, RemovalReason>,
}

impl std::fmt::Display for BroadcastSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fan-out Summary ===")?;
        writeln!(f, "Writes: {}", self.total_writes)?;
        writeln!(f, "Bytes: {}", self.total_bytes)?;
        writeln!(f, "Chunk size (bytes): {}", self.chunk_bytes)?;
        writeln!(f, "Members per write: {}", self.members)?;
        writeln!(f, "Failed sinks: {}", self.failed_sinks)?;

        if !self.removals.is_empty() {
            writeln!(f, "Removed sinks:")?;
            let mut removals: Vec<_> = self.removals.iter().collect();
            removals.sort_by(|a, b| a.0.cmp(b.0));
            for (sink, reason) in removals {
                writeln!(f, "  {}: {}", sink, reason)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = BroadcastAggregator::new();

        aggregator.update(100, 3);
        aggregator.update(50, 2);
        aggregator.record_removal("tcp", RemovalReason::Failed);
        aggregator.record_removal("file", RemovalReason::Closed);

        let summary = aggregator.summary();
        assert_eq!(summary.total_writes, 2);
        assert_eq!(summary.total_bytes, 150);
        assert_eq!(summary.failed_sinks, 1);
        assert!((summary.members.mean - 2.5).abs() < 1e-10);

        aggregator.reset();
        assert_eq!(aggregator.total_writes, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = BroadcastAggregator::new();
        aggregator.update(10, 1);
        aggregator.record_removal("console", RemovalReason::Removed);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Writes: 1"));
        assert!(output.contains("console: removed"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // No recorder installed: the facade discards everything
        record_writer_stats(&WriterStats::default());
        record_broadcast(10, 2);
        record_member_added("a");
        record_member_removed("a", RemovalReason::Closed);
    }
}
