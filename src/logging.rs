// src/logging.rs

//! `tracing` subscriber for the `sidecar` binary.
//!
//! The filter comes from `--log-level` when given. Otherwise `SIDECAR_LOG`
//! is read: either a bare level (`debug`, `warning`) or full directives such
//! as `info,sidecar::agent=warn` to quiet the forwarded agent output. Events
//! go to stderr, and agent lines carry the `sidecar::agent` target.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "SIDECAR_LOG";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

/// Filter for a CLI level and an optional `SIDECAR_LOG` value.
///
/// Unparsable `SIDECAR_LOG` values fall back to `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return level_filter(level.into());
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => match parse_level_str(spec) {
            Some(level) => level_filter(level),
            None => EnvFilter::try_new(spec).unwrap_or_else(|_| level_filter(Level::INFO)),
        },
        None => level_filter(Level::INFO),
    }
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Bare level name, case-insensitive. `warning` is accepted for `warn`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
