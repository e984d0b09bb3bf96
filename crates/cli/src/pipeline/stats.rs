//! Tee run statistics.

use std::time::Duration;

use contracts::WriterStats;
use observability::BroadcastAggregator;

/// Statistics from a tee run
#[derive(Debug, Clone, Default)]
pub struct TeeStats {
    /// Chunks read from the input
    pub chunks: u64,

    /// Bytes read from the input
    pub bytes_in: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Sinks attached at start
    pub sinks_attached: usize,

    /// Final writer counters
    pub writer: WriterStats,

    /// Per-write aggregates and removals
    pub broadcast: BroadcastAggregator,
}

impl TeeStats {
    /// Input throughput in bytes per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_in as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!("\n=== fanout-tee ===");
        eprintln!("Duration: {:.2}s", self.duration.as_secs_f64());
        eprintln!("Chunks read: {}", self.chunks);
        eprintln!("Bytes read: {}", self.bytes_in);
        eprintln!("Throughput: {:.0} B/s", self.throughput());
        eprintln!("Sinks attached: {}", self.sinks_attached);
        eprintln!(
            "Sinks removed: {} failed, {} closed",
            self.writer.removed_failed, self.writer.removed_closed
        );
        eprintln!();
        eprint!("{}", self.broadcast.summary());
    }
}
