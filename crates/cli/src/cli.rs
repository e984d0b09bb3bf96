//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// fanout-tee - broadcast stdin to many sinks at once
#[derive(Parser, Debug)]
#[command(
    name = "fanout-tee",
    author,
    version,
    about = "Broadcast stdin to a set of sinks",
    long_about = "Reads standard input and writes every chunk to all configured sinks \n\
                  (stdout, files, TCP peers, the log). A failing sink is dropped and \n\
                  reported without disturbing the others."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FANOUT_TEE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs always go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "FANOUT_TEE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Broadcast stdin to the configured sinks
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "FANOUT_TEE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also copy to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Also append to this file (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Also stream to this TCP address (repeatable)
    #[arg(long = "connect", value_name = "ADDR")]
    pub connects: Vec<SocketAddr>,

    /// Override input.chunk_size from configuration
    #[arg(long, env = "FANOUT_TEE_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Keep reading input after every sink has been removed
    #[arg(long)]
    pub keep_going: bool,

    /// Validate configuration and exit without reading input
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FANOUT_TEE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tee.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_extra_sinks() {
        let cli = Cli::parse_from([
            "fanout-tee",
            "run",
            "--stdout",
            "--file",
            "a.log",
            "--file",
            "b.log",
            "--connect",
            "127.0.0.1:7000",
            "--chunk-size",
            "1024",
        ]);

        match cli.command {
            Commands::Run(args) => {
                assert!(args.stdout);
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.connects[0].port(), 7000);
                assert_eq!(args.chunk_size, Some(1024));
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["fanout-tee", "-v", "-q", "validate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
