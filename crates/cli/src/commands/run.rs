//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::{SinkConfig, SinkType, TeeBlueprint};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{TeeConfig, TeeSession};

/// Execute the `run` command
pub async fn run_tee(args: &RunArgs) -> Result<()> {
    let blueprint = build_blueprint(args)?;

    info!(
        chunk_size = blueprint.input.chunk_size,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if blueprint.sinks.is_empty() {
        return Err(CliError::NoSinks.into());
    }

    let config = TeeConfig {
        blueprint,
        stop_when_empty: !args.keep_going,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let session = TeeSession::new(config);
    let stats = session
        .run(tokio::io::stdin(), shutdown_signal())
        .await
        .context("Broadcast failed")?;

    info!(
        chunks = stats.chunks,
        bytes = stats.bytes_in,
        duration_secs = stats.duration.as_secs_f64(),
        "fanout-tee finished"
    );
    stats.print_summary();

    Ok(())
}

/// Load the configuration file (if any) and apply command-line sinks and overrides
fn build_blueprint(args: &RunArgs) -> Result<TeeBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => TeeBlueprint {
            version: Default::default(),
            input: Default::default(),
            sinks: Vec::new(),
        },
    };

    apply_overrides(&mut blueprint, args);
    ConfigLoader::validate(&blueprint).context("Invalid configuration after overrides")?;
    Ok(blueprint)
}

fn apply_overrides(blueprint: &mut TeeBlueprint, args: &RunArgs) {
    if let Some(chunk_size) = args.chunk_size {
        info!(chunk_size, "Overriding chunk size from CLI");
        blueprint.input.chunk_size = chunk_size;
    }

    if args.stdout {
        blueprint
            .sinks
            .push(SinkConfig::new("cli-stdout", SinkType::Stdout));
    }
    for (idx, path) in args.files.iter().enumerate() {
        blueprint.sinks.push(
            SinkConfig::new(format!("cli-file-{idx}"), SinkType::File)
                .with_param("path", path.display().to_string()),
        );
    }
    for (idx, addr) in args.connects.iter().enumerate() {
        blueprint.sinks.push(
            SinkConfig::new(format!("cli-connect-{idx}"), SinkType::Network)
                .with_param("addr", addr.to_string()),
        );
    }

    let stdout_sinks = blueprint
        .sinks
        .iter()
        .filter(|s| s.sink_type == SinkType::Stdout)
        .count();
    if stdout_sinks > 1 {
        warn!(count = stdout_sinks, "Several stdout sinks: output will repeat");
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode (stderr, stdout may be a sink)
fn print_config_summary(blueprint: &TeeBlueprint) {
    eprintln!("\n=== Configuration Summary ===\n");
    eprintln!("Chunk size: {} bytes", blueprint.input.chunk_size);
    eprintln!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        let mut params: Vec<_> = sink.params.iter().collect();
        params.sort();
        eprintln!("  - {} ({:?}) {:?}", sink.name, sink.sink_type, params);
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            stdout: false,
            files: Vec::new(),
            connects: Vec::new(),
            chunk_size: None,
            keep_going: false,
            dry_run: true,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_blueprint_from_flags_only() {
        let mut args = args();
        args.stdout = true;
        args.files = vec![PathBuf::from("a.log")];
        args.connects = vec!["127.0.0.1:7000".parse().unwrap()];
        args.chunk_size = Some(16);

        let bp = build_blueprint(&args).unwrap();
        assert_eq!(bp.input.chunk_size, 16);
        let names: Vec<_> = bp.sinks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["cli-stdout", "cli-file-0", "cli-connect-0"]);
    }

    #[test]
    fn test_missing_config_file() {
        let mut args = args();
        args.config = Some(PathBuf::from("/definitely/not/here.toml"));
        let err = build_blueprint(&args).unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[test]
    fn test_zero_chunk_size_override_rejected() {
        let mut args = args();
        args.chunk_size = Some(0);
        assert!(build_blueprint(&args).is_err());
    }

    #[test]
    fn test_config_file_plus_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tee.toml");
        std::fs::write(
            &path,
            "[[sinks]]\nname = \"log\"\nsink_type = \"log\"\n",
        )
        .unwrap();

        let mut args = args();
        args.config = Some(path);
        args.stdout = true;

        let bp = build_blueprint(&args).unwrap();
        assert_eq!(bp.sinks.len(), 2);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
    }
}
