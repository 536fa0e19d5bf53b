// tests/cli_args.rs
use clap::Parser;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

use sidecar::cli::{CliArgs, LogLevel};
use sidecar::exec::runtime_platform;
use sidecar::logging::{build_filter, parse_level_str};

#[test]
fn defaults_point_at_working_directory() {
    let args = CliArgs::try_parse_from(["sidecar"]).unwrap();
    assert_eq!(args.config, "Sidecar.toml");
    assert_eq!(args.bundle, "agent");
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
}

#[test]
fn flags_are_parsed() {
    let args = CliArgs::try_parse_from([
        "sidecar",
        "--config",
        "/etc/host.toml",
        "--bundle",
        "dist/agent",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();
    assert_eq!(args.config, "/etc/host.toml");
    assert_eq!(args.bundle, "dist/agent");
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn unknown_log_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["sidecar", "--log-level", "loud"]).is_err());
}

#[test]
fn env_level_names() {
    assert_eq!(parse_level_str("info"), Some(Level::INFO));
    assert_eq!(parse_level_str(" WARNING "), Some(Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(Level::TRACE));
    assert_eq!(parse_level_str("verbose"), None);
}

#[test]
fn cli_level_wins_over_environment() {
    let filter = build_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
}

#[test]
fn environment_accepts_levels_and_directives() {
    let filter = build_filter(None, Some("warning"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

    let filter = build_filter(None, Some("info,sidecar::agent=warn"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    assert!(filter.to_string().to_lowercase().contains("sidecar::agent=warn"), "got {filter}");
}

#[test]
fn missing_or_broken_environment_falls_back_to_info() {
    assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(build_filter(None, Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(
        build_filter(None, Some("sidecar=bogus")).max_level_hint(),
        Some(LevelFilter::INFO)
    );
}

#[test]
fn platform_is_os_slash_arch() {
    let platform = runtime_platform();
    let (os, arch) = platform.split_once('/').unwrap();
    assert_eq!(os, std::env::consts::OS);
    assert_eq!(arch, std::env::consts::ARCH);
}
