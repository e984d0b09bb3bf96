//! MemorySink - shared in-memory buffer

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use contracts::{ByteSink, ContractError};

/// Sink that appends every write to a shared buffer.
///
/// Clones share the buffer, so a caller can keep one clone to inspect what
/// the writer delivered. A byte limit turns the sink into one that accepts
/// only the remaining room, which the writer treats as a short write.
#[derive(Clone)]
pub struct MemorySink {
    name: String,
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    data: Vec<u8>,
    limit: Option<usize>,
    fail_with: Option<String>,
    writes: u64,
    closed: bool,
}

impl MemorySink {
    /// Create an unbounded memory sink
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(name, MemoryState::default())
    }

    /// Create a sink that holds at most `limit` bytes in total
    pub fn with_limit(name: impl Into<String>, limit: usize) -> Self {
        Self::from_state(
            name,
            MemoryState {
                limit: Some(limit),
                ..Default::default()
            },
        )
    }

    /// Create a sink whose every write fails with `message`
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_state(
            name,
            MemoryState {
                fail_with: Some(message.into()),
                ..Default::default()
            },
        )
    }

    fn from_state(name: impl Into<String>, state: MemoryState) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().data.clone()
    }

    /// Number of write calls that reached the sink
    pub fn write_count(&self) -> u64 {
        self.inner.lock().writes
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Make every later write fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        self.inner.lock().fail_with = Some(message.into());
    }

    /// Drop buffered data
    pub fn clear(&self) {
        self.inner.lock().data.clear();
    }
}

#[async_trait]
impl ByteSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        let mut state = self.inner.lock();
        state.writes += 1;

        if state.closed {
            return Err(ContractError::sink_closed(&self.name));
        }
        if let Some(message) = &state.fail_with {
            return Err(ContractError::sink_write(&self.name, message.clone()));
        }

        let accepted = match state.limit {
            Some(limit) => buf.len().min(limit.saturating_sub(state.data.len())),
            None => buf.len(),
        };
        state.data.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.inner.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_write() {
        let mut sink = MemorySink::new("mem");
        let observer = sink.clone();

        assert_eq!(sink.write(b"abc").await.unwrap(), 3);
        assert_eq!(observer.contents(), b"abc");
        assert_eq!(observer.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_sink_limit() {
        let mut sink = MemorySink::with_limit("small", 4);
        assert_eq!(sink.write(b"abc").await.unwrap(), 3);
        assert_eq!(sink.write(b"def").await.unwrap(), 1);
        assert_eq!(sink.write(b"g").await.unwrap(), 0);
        assert_eq!(sink.contents(), b"abcd");
    }

    #[tokio::test]
    async fn test_memory_sink_failure() {
        let mut sink = MemorySink::failing("bad", "disk full");
        let err = sink.write(b"x").await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn test_memory_sink_closed() {
        let mut sink = MemorySink::new("mem");
        sink.close().await.unwrap();
        assert!(sink.is_closed());
        assert!(matches!(
            sink.write(b"x").await,
            Err(ContractError::SinkClosed { .. })
        ));
    }
}
