// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    ConfigFile, DEFAULT_GATEWAY_HOST, DEFAULT_GATEWAY_PORT, GatewayConfig, RawConfigFile,
    RawSupervisorSection, RuntimeConfig, SupervisorOptions,
};
use crate::errors::{Result, SidecarError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SidecarError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        let supervisor = SupervisorOptions::try_from(raw.supervisor)?;
        let runtime = RuntimeConfig {
            agent_gateway: resolve_gateway(raw.agent_gateway),
            passthrough: raw.passthrough,
        };
        Ok(ConfigFile {
            supervisor,
            runtime,
        })
    }
}

impl TryFrom<RawSupervisorSection> for SupervisorOptions {
    type Error = SidecarError;

    /// Checks:
    /// - every duration parses and is non-zero
    /// - `workspace_prefix` is a plain file name fragment
    fn try_from(raw: RawSupervisorSection) -> Result<Self> {
        let options = SupervisorOptions {
            health_timeout: non_zero_duration("health_timeout", &raw.health_timeout)?,
            poll_interval: non_zero_duration("poll_interval", &raw.poll_interval)?,
            probe_timeout: non_zero_duration("probe_timeout", &raw.probe_timeout)?,
            stop_timeout: non_zero_duration("stop_timeout", &raw.stop_timeout)?,
            workspace_prefix: raw.workspace_prefix,
        };

        if options
            .workspace_prefix
            .chars()
            .any(|c| c == '/' || c == '\\')
        {
            return Err(SidecarError::ConfigError(format!(
                "[supervisor].workspace_prefix must not contain path separators (got {:?})",
                options.workspace_prefix
            )));
        }

        Ok(options)
    }
}

fn resolve_gateway(mut gateway: GatewayConfig) -> GatewayConfig {
    gateway.host = gateway.host.trim().to_string();
    if gateway.host.is_empty() {
        gateway.host = DEFAULT_GATEWAY_HOST.to_string();
    }
    if gateway.port == 0 {
        gateway.port = DEFAULT_GATEWAY_PORT;
    }
    gateway
}

fn non_zero_duration(key: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value).map_err(|e| {
        SidecarError::ConfigError(format!("invalid [supervisor].{key}: {e}"))
    })?;
    if dur.is_zero() {
        return Err(SidecarError::ConfigError(format!(
            "[supervisor].{key} must be greater than zero"
        )));
    }
    Ok(dur)
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
