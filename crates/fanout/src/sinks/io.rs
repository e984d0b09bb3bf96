//! WriterSink - adapter for any tokio async writer

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tracing::{debug, instrument};

use contracts::{ByteSink, ContractError};

/// Sink over an arbitrary [`AsyncWrite`]
///
/// Each write is `write_all` followed by `flush`, so a successful write has
/// always accepted the whole buffer. `close` shuts the writer down.
pub struct WriterSink<W> {
    name: String,
    writer: Option<W>,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap `writer`
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
        }
    }

    /// Recover the writer, unless the sink was closed
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn writer(&mut self) -> Result<&mut W, ContractError> {
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_closed(&self.name))
    }
}

impl WriterSink<Stdout> {
    /// Sink over the process's standard output
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }
}

#[async_trait]
impl<W> ByteSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        let name = self.name.clone();
        let writer = self.writer()?;
        writer
            .write_all(buf)
            .await
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        self.writer()?
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&name, e.to_string()))
    }

    #[instrument(name = "writer_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        debug!(sink = %self.name, "WriterSink closed");
        Ok(())
    }
}
