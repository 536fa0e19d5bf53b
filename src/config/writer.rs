// src/config/writer.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::RuntimeConfig;
use crate::errors::{Result, SidecarError};

/// File name of the agent config inside the bundle root.
pub const AGENT_CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables that carry the absolute config path to the agent.
/// Both are always set to the same value.
pub const CONFIG_PATH_ENV_VARS: [&str; 2] = ["SIDECAR_CONFIG_PATH", "CONFIG_PATH"];

/// Serialize `cfg` as TOML at `path`, creating parent directories.
pub fn write_agent_config(path: &Path, cfg: &RuntimeConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SidecarError::ConfigWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let contents = render_agent_config(cfg)?;
    fs::write(path, contents).map_err(|source| SidecarError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = ?path, "agent config written");
    Ok(())
}

/// TOML text of the agent config.
///
/// Goes through `toml::Value` first so that plain passthrough keys are
/// emitted ahead of any table, whatever their order in the map.
pub fn render_agent_config(cfg: &RuntimeConfig) -> Result<String> {
    let value = toml::Value::try_from(cfg)?;
    Ok(toml::to_string_pretty(&value)?)
}
