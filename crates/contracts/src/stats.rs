//! WriterStats - fan-out writer counters
//!
//! Plain data shared between the writer and the observability layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a sub-writer left the membership set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Its sink failed or short-wrote
    Failed,
    /// The owner called remove
    Removed,
    /// The whole writer was closed
    Closed,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Removed => "removed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of writer-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterStats {
    /// Current member count
    pub members: usize,
    /// Members admitted to the set (adds after close are not admitted)
    pub added: u64,
    /// Broadcast writes performed
    pub writes: u64,
    /// Bytes accepted by `write` (counted once per call, not per member)
    pub bytes: u64,
    /// Members removed because their sink failed
    pub removed_failed: u64,
    /// Members removed by their owner
    pub removed_explicit: u64,
    /// Members removed by close
    pub removed_closed: u64,
    /// Whether the writer has been closed
    pub closed: bool,
}

impl WriterStats {
    /// Total removals across all reasons
    pub fn removed_total(&self) -> u64 {
        self.removed_failed + self.removed_explicit + self.removed_closed
    }

    /// Removals for one reason
    pub fn removed(&self, reason: RemovalReason) -> u64 {
        match reason {
            RemovalReason::Failed => self.removed_failed,
            RemovalReason::Removed => self.removed_explicit,
            RemovalReason::Closed => self.removed_closed,
        }
    }
}
