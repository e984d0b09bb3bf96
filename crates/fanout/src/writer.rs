//! FanOutWriter - broadcast writes to a dynamic set of sinks

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn, Instrument};

use contracts::{ByteSink, ContractError, RemovalReason, WriterStats};

use crate::handle::{MemberId, Notification, SubWriter};
use crate::metrics::MetricsSnapshot;

/// A single logical sink that broadcasts every write to its members.
///
/// Members are added with [`FanOutWriter::add`] and leave the set exactly
/// once: when their sink fails, when their [`RemoveHandle`] is used, or when
/// the writer is closed. Each member learns why through its own
/// [`Notification`]; `write` and `close` never report member failures.
///
/// All operations are serialized by one writer-wide lock, held for the whole
/// of a `write`. A slow sink therefore stalls the writer until it returns.
///
/// Cloning is cheap and every clone refers to the same writer. Dropping the
/// last clone without calling [`close`](FanOutWriter::close) releases the
/// remaining sinks without closing them and notifies their owners with `None`.
#[derive(Clone, Default)]
pub struct FanOutWriter {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Arc<Mutex<State>>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct State {
    members: HashMap<MemberId, Arc<SubWriter>>,
    closed: bool,
    stats: WriterStats,
}

impl State {
    /// Take `member` out of the set and deliver its one notification.
    ///
    /// Safe to call any number of times for the same member; only the first
    /// call has an effect.
    fn remove_member(
        &mut self,
        member: &SubWriter,
        reason: RemovalReason,
        error: Option<ContractError>,
    ) {
        if self.members.remove(&member.id()).is_some() {
            match reason {
                RemovalReason::Failed => self.stats.removed_failed += 1,
                RemovalReason::Removed => self.stats.removed_explicit += 1,
                RemovalReason::Closed => self.stats.removed_closed += 1,
            }
        }

        if member.notify(error) {
            debug!(
                sink = %member.name(),
                member_id = member.id(),
                reason = %reason,
                members = self.members.len(),
                "Member removed"
            );
        }
    }
}

// Runs once the writer and any in-flight broadcast are gone
impl Drop for State {
    fn drop(&mut self) {
        for (_, member) in self.members.drain() {
            member.notify(None);
        }
    }
}

impl FanOutWriter {
    /// Create a writer with no members
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    ///
    /// Returns the handle that removes it again and the notification that
    /// reports why it left. The same underlying resource may be added several
    /// times (e.g. clones of a [`MemorySink`](crate::MemorySink)); each add is
    /// an independent member.
    ///
    /// Adding to a closed writer never admits the sink: its notification
    /// resolves with `None` immediately and the sink is dropped unclosed.
    pub async fn add<S>(&self, sink: S) -> (RemoveHandle, Notification)
    where
        S: ByteSink + 'static,
    {
        self.add_boxed(Box::new(sink)).await
    }

    /// Register an already boxed sink. See [`add`](FanOutWriter::add).
    #[instrument(name = "fanout_add", skip(self, sink), fields(sink = %sink.name()))]
    pub async fn add_boxed(&self, sink: Box<dyn ByteSink>) -> (RemoveHandle, Notification) {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (member, notification) = SubWriter::new(id, sink);
        let member = Arc::new(member);

        let mut state = self.shared.state.lock().await;
        if state.closed {
            member.notify(None);
            debug!(member_id = id, "Writer closed, sink not admitted");
        } else {
            state.members.insert(id, Arc::clone(&member));
            state.stats.added += 1;
            debug!(member_id = id, members = state.members.len(), "Member added");
        }

        let handle = RemoveHandle {
            writer: Arc::downgrade(&self.shared.state),
            member: Arc::downgrade(&member),
        };
        (handle, notification)
    }

    /// Broadcast `buf` to every current member.
    ///
    /// One task per member writes the whole buffer; the call returns once all
    /// of them have finished. A member whose sink errors, short-writes or
    /// panics is removed and gets the error through its notification.
    ///
    /// Always returns `buf.len()`. Writing to a closed or empty writer reaches
    /// no sink and still succeeds.
    ///
    /// Requires a tokio runtime. Once the writer lock is taken the broadcast
    /// runs in its own task, so dropping the returned future (on a timeout,
    /// say) still lets failing members be removed and notified.
    #[instrument(name = "fanout_write", skip(self, buf))]
    pub async fn write(&self, buf: impl Into<Bytes>) -> usize {
        let buf: Bytes = buf.into();
        let len = buf.len();

        let state = Arc::clone(&self.shared.state).lock_owned().await;
        if let Err(e) = tokio::spawn(broadcast(state, buf).in_current_span()).await {
            warn!(error = %e, "Broadcast task failed");
        }

        len
    }

    /// Close every member's sink and remove it.
    ///
    /// Sink close errors and panics are logged, never returned. Only the
    /// first call has an effect. Like `write`, it runs to the end even if the
    /// returned future is dropped.
    #[instrument(name = "fanout_close", skip(self))]
    pub async fn close(&self) {
        let state = Arc::clone(&self.shared.state).lock_owned().await;
        if let Err(e) = tokio::spawn(close_all(state).in_current_span()).await {
            warn!(error = %e, "Close task failed");
        }
    }

    /// Current number of members
    pub async fn len(&self) -> usize {
        self.shared.state.lock().await.members.len()
    }

    /// Whether there are no members
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether [`close`](FanOutWriter::close) has been called
    pub async fn is_closed(&self) -> bool {
        self.shared.state.lock().await.closed
    }

    /// Snapshot of writer-wide counters
    pub async fn stats(&self) -> WriterStats {
        let state = self.shared.state.lock().await;
        WriterStats {
            members: state.members.len(),
            closed: state.closed,
            ..state.stats
        }
    }

    /// Per-member metrics, keyed by sink name
    pub async fn member_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let state = self.shared.state.lock().await;
        state
            .members
            .values()
            .map(|m| (m.name().to_string(), m.metrics().snapshot()))
            .collect()
    }
}

/// Write `buf` to every member and remove the ones that fail.
///
/// Holds the writer lock until every member has finished.
async fn broadcast(mut state: OwnedMutexGuard<State>, buf: Bytes) {
    let len = buf.len();
    state.stats.writes += 1;
    state.stats.bytes += len as u64;

    let pending: Vec<_> = state
        .members
        .values()
        .map(|member| {
            let worker = Arc::clone(member);
            let buf = buf.clone();
            let task = tokio::spawn(async move { worker.write_once(&buf).await });
            (Arc::clone(member), task)
        })
        .collect();

    debug!(bytes = len, members = pending.len(), "Broadcast dispatched");

    for (member, task) in pending {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ContractError::SinkPanicked {
                sink_name: member.name().to_string(),
                message: e.to_string(),
            }),
        };

        if let Err(error) = result {
            warn!(
                sink = %member.name(),
                member_id = member.id(),
                error = %error,
                "Sink write failed, removing member"
            );
            state.remove_member(&member, RemovalReason::Failed, Some(error));
        }
    }
}

async fn close_all(mut state: OwnedMutexGuard<State>) {
    if state.closed {
        debug!("Writer already closed");
        return;
    }
    state.closed = true;

    let members: Vec<_> = state.members.values().cloned().collect();
    for member in &members {
        // A panicking close must not leave members behind in a closed writer
        let worker = Arc::clone(member);
        match tokio::spawn(async move { worker.close_sink().await }).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(sink = %member.name(), error = %e, "Sink close failed"),
            Err(e) => warn!(sink = %member.name(), error = %e, "Sink close panicked"),
        }
        state.remove_member(member, RemovalReason::Closed, None);
    }

    info!(members = members.len(), "Writer closed");
}

/// Removes one member from its writer.
///
/// Idempotent: the first [`remove`](RemoveHandle::remove) takes the member out
/// of the set and resolves its notification with `None`; later calls, and
/// calls after the member left for another reason, do nothing. Clones share
/// that state. The handle keeps neither the writer nor the sink alive.
#[derive(Clone)]
pub struct RemoveHandle {
    writer: Weak<Mutex<State>>,
    member: Weak<SubWriter>,
}

impl RemoveHandle {
    /// Remove the member and notify its owner with `None`
    #[instrument(name = "fanout_remove", skip(self))]
    pub async fn remove(&self) {
        let Some(member) = self.member.upgrade() else {
            return;
        };

        match self.writer.upgrade() {
            Some(state) => {
                let mut state = state.lock().await;
                state.remove_member(&member, RemovalReason::Removed, None);
            }
            None => {
                member.notify(None);
            }
        }
    }

    /// Whether the member has left the writer, for any reason
    pub fn is_removed(&self) -> bool {
        self.member
            .upgrade()
            .map_or(true, |member| member.is_notified())
    }
}

impl std::fmt::Debug for RemoveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveHandle")
            .field("removed", &self.is_removed())
            .finish()
    }
}
