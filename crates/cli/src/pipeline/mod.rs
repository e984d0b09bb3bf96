//! Tee pipeline: input stream → fan-out writer → sinks.

mod stats;
mod tee;

pub use stats::TeeStats;
pub use tee::{TeeConfig, TeeSession};
