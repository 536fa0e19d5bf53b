// tests/health_probe.rs
mod common;
use crate::common::{MockHealthServer, init_tracing, unused_local_port, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::time::Instant;

use sidecar::errors::SidecarError;
use sidecar::health::HealthProber;

type TestResult = Result<(), Box<dyn Error>>;

fn prober(address: &str, timeout: Duration) -> HealthProber {
    HealthProber::with_timing(
        address,
        timeout,
        Duration::from_millis(50),
        Duration::from_millis(500),
    )
    .expect("client")
}

#[tokio::test]
async fn succeeds_on_fourth_poll_after_three_failures() -> TestResult {
    init_tracing();

    let server = MockHealthServer::start(vec![503, 500, 404, 200]).await?;
    let p = prober(&server.address(), Duration::from_secs(5));
    assert_eq!(p.url(), format!("http://{}/health", server.address()));

    with_timeout(p.wait_healthy()).await?;

    assert_eq!(server.served(), vec![503, 500, 404, 200]);
    Ok(())
}

#[tokio::test]
async fn any_2xx_counts_as_healthy() -> TestResult {
    init_tracing();

    let server = MockHealthServer::start(vec![204]).await?;
    with_timeout(prober(&server.address(), Duration::from_secs(5)).wait_healthy()).await?;
    assert_eq!(server.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn never_healthy_fails_after_deadline_naming_the_address() -> TestResult {
    init_tracing();

    let server = MockHealthServer::start(vec![503]).await?;
    let deadline = Duration::from_millis(400);
    let started = Instant::now();

    let err = with_timeout(prober(&server.address(), deadline).wait_healthy())
        .await
        .expect_err("must time out");

    assert!(started.elapsed() >= deadline);
    assert!(matches!(err, SidecarError::HealthTimeout { .. }), "got {err:?}");
    assert!(err.to_string().contains(&server.address()), "got {err}");
    assert!(server.hits() >= 2, "probe must retry, got {}", server.hits());
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_retried_until_deadline() -> TestResult {
    init_tracing();

    let port = unused_local_port().await?;
    let address = format!("127.0.0.1:{port}");
    let p = prober(&address, Duration::from_millis(300));

    assert!(!p.probe_once().await);
    let err = with_timeout(p.wait_healthy()).await.expect_err("must time out");
    assert!(err.to_string().contains(&address), "got {err}");
    Ok(())
}

#[tokio::test]
async fn unrepresentable_deadline_still_polls() -> TestResult {
    init_tracing();

    let server = MockHealthServer::start(vec![503, 200]).await?;
    let p = prober(&server.address(), Duration::from_secs(u64::MAX));

    with_timeout(p.wait_healthy()).await?;
    assert_eq!(server.served(), vec![503, 200]);
    Ok(())
}
