//! LogSink - logs write summaries via tracing

use async_trait::async_trait;
use tracing::{info, instrument};

use contracts::{ByteSink, ContractError};

/// Bytes of each write echoed into the log
const PREVIEW_LEN: usize = 32;

/// Sink that logs a summary of each write for debugging
pub struct LogSink {
    name: String,
    total_bytes: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_bytes: 0,
        }
    }

    /// Bytes logged so far
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

#[async_trait]
impl ByteSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        self.total_bytes += buf.len() as u64;
        let preview = String::from_utf8_lossy(&buf[..buf.len().min(PREVIEW_LEN)]);

        info!(
            sink = %self.name,
            bytes = buf.len(),
            total = self.total_bytes,
            preview = %preview,
            "Chunk received"
        );
        Ok(buf.len())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, total = self.total_bytes, "LogSink closed");
        Ok(())
    }
}
