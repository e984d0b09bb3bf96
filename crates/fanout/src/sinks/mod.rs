//! Sink implementations
//!
//! Contains MemorySink, WriterSink, FileSink, NetworkSink, and LogSink.

mod file;
mod io;
mod log;
mod memory;
mod network;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::io::WriterSink;
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::network::{NetworkSink, NetworkSinkConfig};
