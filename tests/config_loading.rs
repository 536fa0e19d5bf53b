// tests/config_loading.rs
mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::time::Duration;

use sidecar::config::{
    RuntimeConfig, SupervisorOptions, load_and_validate, load_from_str, parse_duration,
    write_agent_config,
};
use sidecar::errors::SidecarError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn empty_config_uses_defaults() -> TestResult {
    init_tracing();

    let cfg = load_from_str("")?;
    assert_eq!(cfg.supervisor, SupervisorOptions::default());
    assert_eq!(cfg.supervisor.health_timeout, Duration::from_secs(30));
    assert_eq!(cfg.supervisor.poll_interval, Duration::from_millis(400));
    assert_eq!(cfg.supervisor.probe_timeout, Duration::from_secs(2));
    assert_eq!(cfg.supervisor.stop_timeout, Duration::from_secs(5));
    assert_eq!(cfg.runtime.address(), "127.0.0.1:8081");
    assert!(cfg.runtime.passthrough.is_empty());
    Ok(())
}

#[test]
fn gateway_blank_host_and_zero_port_fall_back() -> TestResult {
    init_tracing();

    let cfg = load_from_str(
        r#"
        [agent_gateway]
        host = "  "
        port = 0
        "#,
    )?;
    assert_eq!(cfg.runtime.agent_gateway.host, "127.0.0.1");
    assert_eq!(cfg.runtime.agent_gateway.port, 8081);

    let cfg = load_from_str(
        r#"
        [agent_gateway]
        host = "0.0.0.0"
        port = 9000
        "#,
    )?;
    assert_eq!(cfg.runtime.address(), "0.0.0.0:9000");
    Ok(())
}

#[test]
fn unknown_sections_are_passed_through() -> TestResult {
    init_tracing();

    let cfg = load_from_str(
        r#"
        log_level = "debug"

        [supervisor]
        health_timeout = "10s"
        stop_timeout = "750ms"

        [database]
        url = "postgres://localhost/app"
        pool = 4
        "#,
    )?;

    assert_eq!(cfg.supervisor.health_timeout, Duration::from_secs(10));
    assert_eq!(cfg.supervisor.stop_timeout, Duration::from_millis(750));
    assert_eq!(cfg.supervisor.poll_interval, Duration::from_millis(400));

    let passthrough = &cfg.runtime.passthrough;
    assert_eq!(passthrough.len(), 2, "got {passthrough:?}");
    assert_eq!(passthrough["log_level"].as_str(), Some("debug"));
    assert_eq!(
        passthrough["database"]["url"].as_str(),
        Some("postgres://localhost/app")
    );
    assert!(!passthrough.contains_key("supervisor"));
    assert!(!passthrough.contains_key("agent_gateway"));
    Ok(())
}

#[test]
fn invalid_supervisor_values_are_rejected() {
    init_tracing();

    for (text, needle) in [
        ("[supervisor]\nhealth_timeout = \"soon\"", "health_timeout"),
        ("[supervisor]\npoll_interval = \"5\"", "poll_interval"),
        ("[supervisor]\nstop_timeout = \"0s\"", "greater than zero"),
        ("[supervisor]\nworkspace_prefix = \"a/b\"", "path separators"),
    ] {
        match load_from_str(text) {
            Err(SidecarError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{text:?}: unexpected message {msg}")
            }
            other => panic!("{text:?}: expected config error, got {other:?}"),
        }
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    init_tracing();

    let err = load_from_str("[agent_gateway\nport = 1").expect_err("must fail");
    assert!(matches!(err, SidecarError::TomlError(_)), "got {err:?}");
}

#[test]
fn load_from_file() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Sidecar.toml");
    fs::write(&path, "[agent_gateway]\nport = 18081\n")?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.runtime.address(), "127.0.0.1:18081");

    let missing = load_and_validate(tmp.path().join("nope.toml")).expect_err("must fail");
    assert!(matches!(missing, SidecarError::IoError(_)), "got {missing:?}");
    Ok(())
}

#[test]
fn agent_config_is_written_with_parents_and_reads_back() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("agent/nested/config.toml");

    let mut database = toml::Table::new();
    database.insert("url".into(), "postgres://localhost/app".into());
    let runtime = RuntimeConfig::new("127.0.0.1", 18081)
        .with_setting("log_level", "debug")
        .with_setting("database", toml::Value::Table(database));

    write_agent_config(&path, &runtime)?;

    let text = fs::read_to_string(&path)?;
    let back: RuntimeConfig = toml::from_str(&text)?;
    assert_eq!(back, runtime);
    assert!(text.contains("[agent_gateway]"), "got:\n{text}");
    Ok(())
}

#[test]
fn agent_config_write_fails_when_parent_is_a_file() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("agent"), "not a dir")?;

    let err = write_agent_config(&tmp.path().join("agent/config.toml"), &RuntimeConfig::default())
        .expect_err("must fail");
    assert!(matches!(err, SidecarError::ConfigWrite { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn duration_strings() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("ms").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn oversized_durations_are_rejected_not_wrapped() {
    init_tracing();

    let err = parse_duration("18446744073709551615h").expect_err("must overflow");
    assert!(err.contains("too large"), "got {err}");
    assert!(parse_duration("307445734561825861m").is_err());
    assert_eq!(
        parse_duration("307445734561825860m"),
        Ok(Duration::from_secs(307445734561825860 * 60))
    );

    match load_from_str("[supervisor]\nstop_timeout = \"400000000000000000m\"") {
        Err(SidecarError::ConfigError(msg)) => {
            assert!(msg.contains("stop_timeout") && msg.contains("too large"), "got {msg}")
        }
        other => panic!("expected config error, got {other:?}"),
    }
}
