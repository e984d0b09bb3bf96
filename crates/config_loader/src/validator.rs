//! Configuration validation
//!
//! Rules:
//! - input.chunk_size > 0
//! - sink names are non-empty and unique
//! - file sinks carry a `path`
//! - network sinks carry a parseable `addr`
//! - memory sink `limit` (if any) is an integer

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, SinkConfig, SinkType, TeeBlueprint};

/// Validate a TeeBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    validate_input(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_sink_params(blueprint)?;
    Ok(())
}

fn validate_input(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    if blueprint.input.chunk_size == 0 {
        return Err(ContractError::config_validation(
            "input.chunk_size",
            "chunk_size must be > 0",
        ));
    }
    Ok(())
}

/// Sink names are used in logs and metrics, so they must identify one sink
fn validate_sink_names(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_sink_params(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    for sink in &blueprint.sinks {
        match sink.sink_type {
            SinkType::File => require_param(sink, "path").map(|_| ())?,
            SinkType::Network => {
                let addr = require_param(sink, "addr")?;
                addr.parse::<SocketAddr>().map_err(|e| {
                    ContractError::config_validation(
                        format!("sinks[{}].params.addr", sink.name),
                        format!("invalid address '{}': {}", addr, e),
                    )
                })?;
            }
            SinkType::Memory => {
                if let Some(limit) = sink.params.get("limit") {
                    limit.parse::<usize>().map_err(|_| {
                        ContractError::config_validation(
                            format!("sinks[{}].params.limit", sink.name),
                            format!("limit must be a byte count, got '{}'", limit),
                        )
                    })?;
                }
            }
            SinkType::Stdout | SinkType::Log => {}
        }
    }
    Ok(())
}

fn require_param<'a>(sink: &'a SinkConfig, key: &str) -> Result<&'a str, ContractError> {
    sink.params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ContractError::config_validation(
                format!("sinks[{}].params.{}", sink.name, key),
                format!("{:?} sink requires '{}'", sink.sink_type, key),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, InputConfig};

    fn minimal_blueprint() -> TeeBlueprint {
        TeeBlueprint {
            version: ConfigVersion::V1,
            input: InputConfig::default(),
            sinks: vec![
                SinkConfig::new("console", SinkType::Stdout),
                SinkConfig::new("archive", SinkType::File).with_param("path", "out.log"),
                SinkConfig::new("upstream", SinkType::Network)
                    .with_param("addr", "127.0.0.1:7000"),
            ],
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_no_sinks_is_valid() {
        let mut bp = minimal_blueprint();
        bp.sinks.clear();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_chunk_size() {
        let mut bp = minimal_blueprint();
        bp.input.chunk_size = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("chunk_size must be > 0"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(SinkConfig::new("console", SinkType::Log));
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_file_sink_without_path() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].params.clear();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("requires 'path'"), "got: {err}");
    }

    #[test]
    fn test_network_sink_bad_addr() {
        let mut bp = minimal_blueprint();
        bp.sinks[2]
            .params
            .insert("addr".to_string(), "localhost".to_string());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("invalid address"), "got: {err}");
    }

    #[test]
    fn test_memory_sink_bad_limit() {
        let mut bp = minimal_blueprint();
        bp.sinks
            .push(SinkConfig::new("mem", SinkType::Memory).with_param("limit", "-1"));
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("byte count"), "got: {err}");
    }
}
