//! # Integration Tests
//!
//! Cross-crate scenarios:
//! - Config file → sinks → fan-out writer
//! - Membership changes while writes are in flight
//! - Failure routing across real file and TCP sinks

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        let _ = contracts::WriterStats::default();
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use bytes::Bytes;
    use config_loader::ConfigLoader;
    use contracts::{ContractError, RemovalReason, SinkConfig, SinkType};
    use fanout::{attach_sinks, FanOutWriter, MemorySink, NetworkSink};
    use observability::BroadcastAggregator;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// End-to-end: TOML config → attach_sinks → writer → files on disk
    #[tokio::test]
    async fn test_e2e_config_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        let toml = format!(
            r#"
version = "V1"

[input]
chunk_size = 4

[[sinks]]
name = "first"
sink_type = "file"
[sinks.params]
path = "{}"

[[sinks]]
name = "second"
sink_type = "file"
[sinks.params]
path = "{}"
append = "false"

[[sinks]]
name = "log"
sink_type = "log"
"#,
            first.display(),
            second.display()
        );

        let blueprint = ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
            .expect("config should parse");
        assert_eq!(blueprint.sinks.len(), 3);

        let writer = FanOutWriter::new();
        let registrations = attach_sinks(&writer, &blueprint.sinks).await.unwrap();
        assert_eq!(writer.len().await, 3);

        let mut aggregator = BroadcastAggregator::new();
        for chunk in [&b"hello "[..], b"fan-out ", b"world"] {
            let n = writer.write(Bytes::copy_from_slice(chunk)).await;
            assert_eq!(n, chunk.len());
            aggregator.update(n, writer.len().await);
        }
        writer.close().await;

        assert_eq!(std::fs::read(&first).unwrap(), b"hello fan-out world");
        assert_eq!(std::fs::read(&second).unwrap(), b"hello fan-out world");

        for registration in registrations {
            assert!(registration.notification.await.unwrap().is_none());
            assert!(registration.remove.is_removed());
        }

        let stats = writer.stats().await;
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.removed_closed, 3);
        assert_eq!(aggregator.summary().total_bytes, 19);
    }

    /// The classic two-member scenario: one member leaves between writes
    #[tokio::test]
    async fn test_e2e_remove_between_writes() {
        let writer = FanOutWriter::new();
        let a = MemorySink::new("a");
        let b = MemorySink::new("b");

        let (_remove_a, rx_a) = writer.add(a.clone()).await;
        let (remove_b, rx_b) = writer.add(b.clone()).await;

        writer.write(&b"hello"[..]).await;
        remove_b.remove().await;
        writer.write(&b" world"[..]).await;
        writer.close().await;

        assert_eq!(a.contents(), b"hello world");
        assert_eq!(b.contents(), b"hello");
        assert!(rx_a.await.unwrap().is_none());
        assert!(rx_b.await.unwrap().is_none());
        // Explicit removal does not close the sink
        assert!(!b.is_closed());
        assert!(a.is_closed());
    }

    /// A sink that starts failing is dropped; the others keep receiving
    #[tokio::test]
    async fn test_e2e_failure_isolation() {
        let writer = FanOutWriter::new();
        let healthy = MemorySink::new("healthy");
        let flaky = MemorySink::new("flaky");

        let (_h, rx_healthy) = writer.add(healthy.clone()).await;
        let (remove_flaky, rx_flaky) = writer.add(flaky.clone()).await;

        writer.write(&b"one "[..]).await;
        flaky.fail_with("disk full");
        writer.write(&b"two "[..]).await;
        writer.write(&b"three"[..]).await;

        match rx_flaky.await.unwrap() {
            Some(ContractError::SinkWrite { sink_name, message }) => {
                assert_eq!(sink_name, "flaky");
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
        assert!(remove_flaky.is_removed());
        // Removing an already failed member is a no-op
        remove_flaky.remove().await;

        assert_eq!(flaky.write_count(), 2);
        assert_eq!(healthy.contents(), b"one two three");

        let stats = writer.stats().await;
        assert_eq!(stats.removed(RemovalReason::Failed), 1);
        assert_eq!(stats.removed(RemovalReason::Removed), 0);
        assert_eq!(stats.members, 1);

        writer.close().await;
        assert!(rx_healthy.await.unwrap().is_none());
    }

    /// TCP sink delivers bytes to a real listener
    #[tokio::test]
    async fn test_e2e_network_sink() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        let config = SinkConfig::new("net", SinkType::Network).with_param("addr", addr.to_string());
        let writer = FanOutWriter::new();
        let mut registrations = attach_sinks(&writer, &[config]).await.unwrap();

        writer.write(&b"over "[..]).await;
        writer.write(&b"the wire"[..]).await;
        writer.close().await;

        let received = tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .expect("reader timed out")
            .unwrap();
        assert_eq!(received, b"over the wire");

        let registration = registrations.remove(0);
        assert!(registration.notification.await.unwrap().is_none());
    }

    /// Connecting to a port nobody listens on fails at creation, not at write
    #[tokio::test]
    async fn test_e2e_network_sink_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SinkConfig::new("net", SinkType::Network).with_param("addr", addr.to_string());
        let err = NetworkSink::from_params("net", &config.params)
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, ContractError::SinkConnection { .. }));
    }

    /// Members join and leave from other tasks while writes keep going
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_membership() {
        let writer = FanOutWriter::new();
        let steady = MemorySink::new("steady");
        let (_steady_handle, _steady_rx) = writer.add(steady.clone()).await;

        let churn = {
            let writer = writer.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    let sink = MemorySink::new(format!("churn-{i}"));
                    let (remove, rx) = writer.add(sink).await;
                    tokio::task::yield_now().await;
                    remove.remove().await;
                    assert!(rx.await.unwrap().is_none());
                }
            })
        };

        let writes = {
            let writer = writer.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    writer.write(&b"x"[..]).await;
                }
            })
        };

        churn.await.unwrap();
        writes.await.unwrap();

        assert_eq!(steady.contents().len(), 200);
        let stats = writer.stats().await;
        assert_eq!(stats.added, 51);
        assert_eq!(stats.removed_explicit, 50);
        assert_eq!(stats.members, 1);
    }

    /// Dropping the writer releases every member with a clean notification
    #[tokio::test]
    async fn test_e2e_drop_writer_notifies() {
        let writer = FanOutWriter::new();
        let sink = MemorySink::new("orphan");
        let (remove, rx) = writer.add(sink.clone()).await;

        drop(writer);

        assert!(rx.await.unwrap().is_none());
        remove.remove().await;
        assert!(remove.is_removed());
        assert!(!sink.is_closed());
    }
}
