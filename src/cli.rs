// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sidecar`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sidecar",
    version,
    about = "Run a bundled agent process next to the host and keep it healthy.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the host config file (TOML).
    ///
    /// Default: `Sidecar.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Sidecar.toml")]
    pub config: String,

    /// Directory containing the agent bundle (binary and support files).
    #[arg(long, value_name = "DIR", default_value = "agent")]
    pub bundle: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIDECAR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config and bundle, print what would be launched, don't launch.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
