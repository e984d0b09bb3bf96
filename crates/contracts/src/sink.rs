//! ByteSink trait - fan-out output interface
//!
//! Defines the abstract interface for sub-writers.

use async_trait::async_trait;

use crate::ContractError;

/// Byte output trait
///
/// Every sub-writer registered with a fan-out writer implements this trait.
/// Object safe, so heterogeneous sinks can share one membership set.
#[async_trait]
pub trait ByteSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write the whole buffer
    ///
    /// Returns the number of bytes accepted. The writer treats any count other
    /// than `buf.len()` as a short write and removes the sink.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Close sink
    ///
    /// Called at most once, when the owning writer is closed. Sinks with
    /// nothing to release keep the default.
    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[async_trait]
impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        (**self).write(buf).await
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush().await
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        (**self).close().await
    }
}
