#![allow(dead_code, unused_imports)]

use std::sync::Arc;
use std::time::Duration;

use sidecar::Supervisor;
use sidecar::assets::AssetSource;
use sidecar::config::{RuntimeConfig, SupervisorOptions};

pub use sidecar_test_utils::*;

/// Short timings so failing paths finish quickly.
pub fn test_options() -> SupervisorOptions {
    SupervisorOptions {
        health_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(50),
        probe_timeout: Duration::from_millis(500),
        stop_timeout: Duration::from_secs(3),
        workspace_prefix: "sidecar-test-".to_string(),
    }
}

/// Supervisor whose agent is expected on `127.0.0.1:port`.
pub fn supervisor_for(
    bundle: impl AssetSource + 'static,
    port: u16,
    options: SupervisorOptions,
) -> Supervisor {
    let runtime = RuntimeConfig::new("127.0.0.1", port).with_setting("log_level", "debug");
    Supervisor::new(runtime, Arc::new(bundle), options)
}
