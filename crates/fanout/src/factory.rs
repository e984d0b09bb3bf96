//! Sink factory - build sinks from configuration and attach them to a writer

use std::collections::HashMap;

use tracing::{info, instrument};

use contracts::{ByteSink, SinkConfig, SinkType};

use crate::error::FanOutError;
use crate::handle::Notification;
use crate::sinks::{FileSink, LogSink, MemorySink, NetworkSink, WriterSink};
use crate::writer::{FanOutWriter, RemoveHandle};

/// A sink attached to a writer, with everything its owner needs
#[derive(Debug)]
pub struct Registration {
    /// Configured sink name
    pub name: String,
    /// Removes the sink from the writer
    pub remove: RemoveHandle,
    /// Resolves when the sink leaves the writer
    pub notification: Notification,
}

/// Create a sink from configuration
#[instrument(
    name = "fanout_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(config: &SinkConfig) -> Result<Box<dyn ByteSink>, FanOutError> {
    match config.sink_type {
        SinkType::Stdout => Ok(Box::new(WriterSink::new(
            &config.name,
            tokio::io::stdout(),
        ))),
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::Memory => {
            let sink = match memory_limit(&config.params)
                .map_err(|e| FanOutError::sink_creation(&config.name, e))?
            {
                Some(limit) => MemorySink::with_limit(&config.name, limit),
                None => MemorySink::new(&config.name),
            };
            Ok(Box::new(sink))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| FanOutError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| FanOutError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

fn memory_limit(params: &HashMap<String, String>) -> Result<Option<usize>, String> {
    params
        .get("limit")
        .map(|raw| {
            raw.parse()
                .map_err(|e| format!("invalid 'limit' value '{}': {}", raw, e))
        })
        .transpose()
}

/// Create every configured sink, then add them all to `writer`.
///
/// Nothing is added unless every sink could be created.
#[instrument(name = "fanout_attach_sinks", skip(writer, configs), fields(sink_count = configs.len()))]
pub async fn attach_sinks(
    writer: &FanOutWriter,
    configs: &[SinkConfig],
) -> Result<Vec<Registration>, FanOutError> {
    let mut sinks = Vec::with_capacity(configs.len());
    for config in configs {
        sinks.push((config.name.clone(), create_sink(config).await?));
    }

    let mut registrations = Vec::with_capacity(sinks.len());
    for (name, sink) in sinks {
        let (remove, notification) = writer.add_boxed(sink).await;
        registrations.push(Registration {
            name,
            remove,
            notification,
        });
    }

    info!(sinks = registrations.len(), "Sinks attached");
    Ok(registrations)
}
