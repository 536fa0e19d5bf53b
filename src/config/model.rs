// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_GATEWAY_PORT: u16 = 8081;

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(400);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WORKSPACE_PREFIX: &str = "sidecar-agent-";

/// Host configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// health_timeout = "30s"
/// poll_interval = "400ms"
///
/// [agent_gateway]
/// host = "127.0.0.1"
/// port = 8081
///
/// [database]
/// url = "postgres://localhost/app"
/// ```
///
/// `[supervisor]` and `[agent_gateway]` are understood by the supervisor.
/// Every other key is handed to the agent untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: RawSupervisorSection,

    #[serde(default)]
    pub agent_gateway: GatewayConfig,

    #[serde(flatten)]
    pub passthrough: toml::Table,
}

/// `[supervisor]` section, durations still in their string form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSupervisorSection {
    /// Overall deadline for the agent to answer its health endpoint.
    #[serde(default = "default_health_timeout")]
    pub health_timeout: String,

    /// Delay between two health probes.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Timeout of a single health request.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,

    /// How long `stop` waits for a graceful exit before killing the agent.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: String,

    /// File name prefix of the per-start temporary workspace.
    #[serde(default = "default_workspace_prefix")]
    pub workspace_prefix: String,
}

fn default_health_timeout() -> String {
    "30s".to_string()
}

fn default_poll_interval() -> String {
    "400ms".to_string()
}

fn default_probe_timeout() -> String {
    "2s".to_string()
}

fn default_stop_timeout() -> String {
    "5s".to_string()
}

fn default_workspace_prefix() -> String {
    DEFAULT_WORKSPACE_PREFIX.to_string()
}

impl Default for RawSupervisorSection {
    fn default() -> Self {
        Self {
            health_timeout: default_health_timeout(),
            poll_interval: default_poll_interval(),
            probe_timeout: default_probe_timeout(),
            stop_timeout: default_stop_timeout(),
            workspace_prefix: default_workspace_prefix(),
        }
    }
}

/// `[agent_gateway]` section: where the agent listens.
///
/// An empty host or a zero port means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,
}

impl GatewayConfig {
    /// `host:port` form used for probing and logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Validated host configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub supervisor: SupervisorOptions,
    pub runtime: RuntimeConfig,
}

/// Timing and layout knobs of the supervisor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOptions {
    pub health_timeout: Duration,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
    pub stop_timeout: Duration,
    pub workspace_prefix: String,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
        }
    }
}

/// The part of the host configuration the agent needs.
///
/// This is exactly what gets serialized into the agent's `config.toml`:
/// the resolved gateway plus every passthrough setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub agent_gateway: GatewayConfig,

    #[serde(flatten)]
    pub passthrough: toml::Table,
}

impl RuntimeConfig {
    /// Runtime config with the given gateway and no passthrough settings.
    /// Empty host / zero port fall back to the defaults.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let mut gateway = GatewayConfig {
            host: host.into(),
            port,
        };
        if gateway.host.trim().is_empty() {
            gateway.host = DEFAULT_GATEWAY_HOST.to_string();
        }
        if gateway.port == 0 {
            gateway.port = DEFAULT_GATEWAY_PORT;
        }
        Self {
            agent_gateway: gateway,
            passthrough: toml::Table::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.passthrough.insert(key.into(), value.into());
        self
    }

    pub fn address(&self) -> String {
        self.agent_gateway.address()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_HOST, DEFAULT_GATEWAY_PORT)
    }
}
