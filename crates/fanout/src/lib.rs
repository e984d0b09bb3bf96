//! # Fan-out
//!
//! Dynamic fan-out writer.
//!
//! Responsibilities:
//! - Broadcast every write to a changing set of sub-writers
//! - Add and remove sub-writers at any time, including during writes
//! - Route each sub-writer's failure to its own one-shot notification
//! - Isolate a failing sink from the others and from the caller

pub mod error;
pub mod factory;
mod handle;
pub mod metrics;
pub mod sinks;
pub mod writer;

pub use contracts::{ByteSink, ContractError, RemovalReason, WriterStats};
pub use error::FanOutError;
pub use factory::{attach_sinks, create_sink, Registration};
pub use handle::Notification;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink, MemorySink, NetworkSink, WriterSink};
pub use writer::{FanOutWriter, RemoveHandle};
