//! Tee session - reads an input stream and broadcasts it to every sink.

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use bytes::Bytes;
use contracts::{RemovalReason, TeeBlueprint};
use fanout::{attach_sinks, FanOutWriter, Registration};
use observability::{record_broadcast, record_member_added, record_member_removed, record_writer_stats};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::TeeStats;

/// Tee session configuration
#[derive(Debug, Clone)]
pub struct TeeConfig {
    /// Input and sink configuration
    pub blueprint: TeeBlueprint,

    /// Stop reading once every sink has been removed
    pub stop_when_empty: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One run of the tee
pub struct TeeSession {
    config: TeeConfig,
}

impl TeeSession {
    pub fn new(config: TeeConfig) -> Self {
        Self { config }
    }

    /// Broadcast `input` until EOF, `shutdown` resolves, or (optionally)
    /// no sink is left. The writer is closed before returning.
    pub async fn run<R, F>(self, mut input: R, shutdown: F) -> Result<TeeStats>
    where
        R: AsyncRead + Unpin,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let writer = FanOutWriter::new();
        let registrations = attach_sinks(&writer, &blueprint.sinks)
            .await
            .context("Failed to create sinks")?;

        let mut stats = TeeStats {
            sinks_attached: registrations.len(),
            ..Default::default()
        };
        let watchers: Vec<_> = registrations.into_iter().map(watch_member).collect();

        let mut buf = vec![0u8; blueprint.input.chunk_size];
        tokio::pin!(shutdown);

        // Sinks are closed whatever ends the loop, a read error included
        let outcome: Result<()> = loop {
            let n = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                read = input.read(&mut buf) => match read {
                    Ok(n) => n,
                    Err(e) => break Err(e).context("Failed to read input"),
                },
            };

            if n == 0 {
                debug!("Input reached EOF");
                break Ok(());
            }

            writer.write(Bytes::copy_from_slice(&buf[..n])).await;
            let members = writer.len().await;

            stats.chunks += 1;
            stats.bytes_in += n as u64;
            stats.broadcast.update(n, members);
            record_broadcast(n, members);
            record_writer_stats(&writer.stats().await);

            if members == 0 && self.config.stop_when_empty {
                warn!("Every sink has been removed, stopping");
                break Ok(());
            }
        };

        writer.close().await;

        for watcher in watchers {
            match watcher.await {
                Ok((name, reason)) => stats.broadcast.record_removal(&name, reason),
                Err(e) => warn!(error = %e, "Sink watcher failed"),
            }
        }

        stats.writer = writer.stats().await;
        record_writer_stats(&stats.writer);
        stats.duration = start_time.elapsed();

        outcome?;
        Ok(stats)
    }
}

/// Log a sink's removal as soon as its notification arrives.
///
/// Sinks are never removed explicitly here, so a clean notification means
/// the writer was closed.
fn watch_member(registration: Registration) -> JoinHandle<(String, RemovalReason)> {
    record_member_added(&registration.name);
    let Registration {
        name, notification, ..
    } = registration;

    tokio::spawn(async move {
        let reason = match notification.await {
            Ok(Some(error)) => {
                warn!(sink = %name, error = %error, "Sink removed after failure");
                RemovalReason::Failed
            }
            Ok(None) | Err(_) => {
                debug!(sink = %name, "Sink closed");
                RemovalReason::Closed
            }
        };
        record_member_removed(&name, reason);
        (name, reason)
    })
}
