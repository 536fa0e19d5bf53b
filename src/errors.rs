// src/errors.rs

//! Crate-wide error types.
//!
//! - [`SidecarError`] covers configuration loading and every fatal step of
//!   `Supervisor::start`.
//! - [`StopError`] is what `Supervisor::stop` reports. It is `Clone` so that
//!   every caller of `stop` observes the outcome of the single execution.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("create runtime workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("extract agent assets: {0:#}")]
    Extract(#[source] anyhow::Error),

    #[error("write agent config at {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize agent config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("agent binary missing at {path:?}")]
    BinaryMissing { path: PathBuf },

    #[error("chmod agent binary {path:?}: {source}")]
    Chmod {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("start bundled agent runtime: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("bundled agent runtime health check timeout: {url}")]
    HealthTimeout { url: String },

    #[error("bundled agent runtime exited before becoming healthy ({status})")]
    AgentExitedEarly { status: ExitStatus },

    #[error("supervisor has already been started")]
    AlreadyStarted,

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Outcome of a failed `Supervisor::stop`.
#[derive(Error, Debug, Clone)]
pub enum StopError {
    #[error("stop cancelled; agent process was killed")]
    Cancelled,

    #[error("bundled agent runtime exited abnormally ({status})")]
    AgentExited { status: ExitStatus },

    #[error("waiting for bundled agent runtime: {0}")]
    Wait(#[source] Arc<std::io::Error>),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SidecarError>;
