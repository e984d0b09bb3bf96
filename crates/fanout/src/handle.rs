//! SubWriter - one member of a fan-out writer
//!
//! Binds a sink to its one-shot removal notification and its metrics.

use parking_lot::Mutex;
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use contracts::{ByteSink, ContractError};

use crate::metrics::SinkMetrics;

/// Receiving side of a sub-writer's removal notification.
///
/// Resolves exactly once: with the sink error that caused the removal, or
/// `None` when the sub-writer was removed by its owner or by closing the
/// writer. The channel is closed right after that value. Dropping the
/// receiver unread is fine.
pub type Notification = oneshot::Receiver<Option<ContractError>>;

pub(crate) type MemberId = u64;

pub(crate) struct SubWriter {
    id: MemberId,
    name: String,
    sink: AsyncMutex<Box<dyn ByteSink>>,
    /// Producer side; `None` once the notification has been delivered
    notify: Mutex<Option<oneshot::Sender<Option<ContractError>>>>,
    metrics: SinkMetrics,
}

impl SubWriter {
    pub(crate) fn new(id: MemberId, sink: Box<dyn ByteSink>) -> (Self, Notification) {
        let (tx, rx) = oneshot::channel();
        let member = Self {
            id,
            name: sink.name().to_string(),
            sink: AsyncMutex::new(sink),
            notify: Mutex::new(Some(tx)),
            metrics: SinkMetrics::new(),
        };
        (member, rx)
    }

    pub(crate) fn id(&self) -> MemberId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Write the full buffer to the sink once.
    ///
    /// Anything but `Ok(buf.len())` from the sink is an error.
    pub(crate) async fn write_once(&self, buf: &[u8]) -> Result<(), ContractError> {
        let mut sink = self.sink.lock().await;
        match sink.write(buf).await {
            Ok(n) if n == buf.len() => {
                self.metrics.record_write(n);
                Ok(())
            }
            Ok(n) => {
                self.metrics.inc_failure_count();
                Err(ContractError::short_write(&self.name, n, buf.len()))
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                Err(e)
            }
        }
    }

    pub(crate) async fn close_sink(&self) -> Result<(), ContractError> {
        self.sink.lock().await.close().await
    }

    /// Deliver the removal notification.
    ///
    /// Returns false if it was already delivered; the value is then dropped.
    pub(crate) fn notify(&self, error: Option<ContractError>) -> bool {
        let Some(tx) = self.notify.lock().take() else {
            return false;
        };
        // A dropped receiver just discards the value.
        let _ = tx.send(error);
        true
    }

    pub(crate) fn is_notified(&self) -> bool {
        self.notify.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use tokio::sync::oneshot::error::TryRecvError;

    #[tokio::test]
    async fn test_notify_delivers_once() {
        let (member, mut rx) = SubWriter::new(1, Box::new(MemorySink::new("mem")));

        assert!(member.notify(Some(ContractError::sink_write("mem", "boom"))));
        assert!(!member.notify(None));
        assert!(member.is_notified());

        let delivered = rx.try_recv().unwrap();
        assert!(matches!(delivered, Some(ContractError::SinkWrite { .. })));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Closed)));
    }

    #[tokio::test]
    async fn test_notify_with_dropped_receiver() {
        let (member, rx) = SubWriter::new(1, Box::new(MemorySink::new("mem")));
        drop(rx);
        assert!(member.notify(None));
        assert!(!member.notify(None));
    }

    #[tokio::test]
    async fn test_write_once_short_write() {
        let sink = MemorySink::with_limit("small", 2);
        let (member, _rx) = SubWriter::new(1, Box::new(sink.clone()));

        let err = member.write_once(b"abc").await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::ShortWrite {
                written: 2,
                expected: 3,
                ..
            }
        ));
        assert_eq!(member.metrics().failure_count(), 1);
        assert_eq!(sink.contents(), b"ab");
    }

    #[tokio::test]
    async fn test_write_once_records_metrics() {
        let (member, _rx) = SubWriter::new(7, Box::new(MemorySink::new("mem")));
        member.write_once(b"hello").await.unwrap();

        assert_eq!(member.id(), 7);
        assert_eq!(member.name(), "mem");
        assert_eq!(member.metrics().write_count(), 1);
        assert_eq!(member.metrics().bytes_written(), 5);
    }
}
