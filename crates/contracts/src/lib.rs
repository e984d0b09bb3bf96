//! # Contracts
//!
//! Shared interface contracts between the fan-out core, the sinks, the config
//! loader and the binaries. Business crates depend on this crate, never the
//! other way round.
//!
//! ## Sink model
//! - A sink accepts whole buffers; anything less than the full length is a failure
//! - `close` is optional and invoked at most once by the writer

mod blueprint;
mod error;
mod sink;
mod stats;

pub use blueprint::*;
pub use error::*;
pub use sink::*;
pub use stats::*;
