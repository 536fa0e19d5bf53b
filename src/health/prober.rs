// src/health/prober.rs

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::SupervisorOptions;
use crate::errors::{Result, SidecarError};

pub const HEALTH_PATH: &str = "/health";

/// Polls `http://{address}/health` until it answers 2xx or a deadline passes.
///
/// Individual probe failures (connection refused, non-2xx, request timeout)
/// are retried after `poll_interval`. Only running out of time is an error.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl HealthProber {
    pub fn new(address: &str, options: &SupervisorOptions) -> Result<Self> {
        Self::with_timing(
            address,
            options.health_timeout,
            options.poll_interval,
            options.probe_timeout,
        )
    }

    pub fn with_timing(
        address: &str,
        timeout: Duration,
        poll_interval: Duration,
        probe_timeout: Duration,
    ) -> Result<Self> {
        // The agent is always local; never route probes through a proxy.
        let client = reqwest::Client::builder()
            .timeout(probe_timeout)
            .no_proxy()
            .build()
            .map_err(|e| SidecarError::Other(e.into()))?;

        Ok(Self {
            client,
            url: format!("http://{address}{HEALTH_PATH}"),
            timeout,
            poll_interval,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One GET against the health endpoint. `true` on any 2xx status.
    pub async fn probe_once(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(url = %self.url, status = %resp.status(), "health probe not ready");
                false
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "health probe failed");
                false
            }
        }
    }

    /// Block until the endpoint reports healthy.
    ///
    /// Fails with [`SidecarError::HealthTimeout`], naming the probed URL, once
    /// `timeout` has elapsed without a 2xx answer.
    pub async fn wait_healthy(&self) -> Result<()> {
        let started = Instant::now();
        // `None` when the timeout is beyond what the clock can represent.
        let deadline = started.checked_add(self.timeout);
        let mut attempts: u32 = 0;

        while deadline.is_none_or(|d| Instant::now() < d) {
            attempts += 1;
            if self.probe_once().await {
                info!(
                    url = %self.url,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "agent health check passed"
                );
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }

        Err(SidecarError::HealthTimeout {
            url: self.url.clone(),
        })
    }
}
