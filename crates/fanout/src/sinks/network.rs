//! NetworkSink - TCP byte stream

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use contracts::{ByteSink, ContractError};

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Disable Nagle's algorithm
    pub nodelay: bool,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let nodelay = match params.get("nodelay").map(String::as_str) {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => return Err(format!("invalid 'nodelay' value '{}'", other)),
        };

        Ok(Self { addr, nodelay })
    }
}

/// Sink that streams bytes over a TCP connection
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    stream: Option<TcpStream>,
}

impl NetworkSink {
    /// Connect to the configured address
    #[instrument(name = "network_sink_connect", skip(name, config), fields(target = %config.addr))]
    pub async fn connect(
        name: impl Into<String>,
        config: NetworkSinkConfig,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let stream = TcpStream::connect(config.addr).await?;
        stream.set_nodelay(config.nodelay)?;

        debug!(sink = %name, target = %config.addr, "NetworkSink connected");

        Ok(Self {
            name,
            config,
            stream: Some(stream),
        })
    }

    /// Create from params (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        Self::connect(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    /// Remote address
    pub fn addr(&self) -> SocketAddr {
        self.config.addr
    }

    fn stream(&mut self) -> Result<&mut TcpStream, ContractError> {
        self.stream
            .as_mut()
            .ok_or_else(|| ContractError::sink_closed(&self.name))
    }
}

#[async_trait]
impl ByteSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_write",
        skip(self, buf),
        fields(sink = %self.name, bytes = buf.len())
    )]
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ContractError> {
        let name = self.name.clone();
        self.stream()?.write_all(buf).await.map_err(|e| {
            warn!(sink = %name, error = %e, "TCP send failed");
            ContractError::sink_write(&name, e.to_string())
        })?;
        Ok(buf.len())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}
