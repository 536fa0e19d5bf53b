// src/lib.rs

pub mod assets;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod health;
pub mod logging;
pub mod supervisor;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::assets::{AssetKind, AssetSource, DirSource};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;

pub use crate::supervisor::Supervisor;
pub use crate::types::LifecycleState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the agent bundle on disk
/// - the supervisor (start, wait for Ctrl-C, stop)
///
/// The first Ctrl-C stops the agent gracefully (or aborts a start still in
/// progress); a second one cancels the graceful stop and kills it.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let bundle = Arc::new(DirSource::new(&args.bundle));

    if args.dry_run {
        print_dry_run(&cfg, bundle.as_ref())?;
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let force = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        let force = force.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            shutdown.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                force.cancel();
            }
        });
    }

    let mut supervisor = Supervisor::new(cfg.runtime, bundle, cfg.supervisor);
    supervisor.start(&shutdown).await?;
    info!(
        state = %supervisor.state(),
        addr = %supervisor.address(),
        "agent ready; press Ctrl-C to stop"
    );

    shutdown.cancelled().await;
    supervisor.stop(&force).await?;
    Ok(())
}

/// Print the resolved agent config and the bundle contents.
fn print_dry_run(cfg: &ConfigFile, bundle: &DirSource) -> Result<()> {
    println!("sidecar dry-run");
    println!("  agent address = {}", cfg.runtime.address());
    println!(
        "  health_timeout = {:?}, poll_interval = {:?}, stop_timeout = {:?}",
        cfg.supervisor.health_timeout, cfg.supervisor.poll_interval, cfg.supervisor.stop_timeout
    );
    println!();

    println!("agent config ({}):", config::AGENT_CONFIG_FILE_NAME);
    for line in config::render_agent_config(&cfg.runtime)?.lines() {
        println!("  {line}");
    }
    println!();

    let entries = bundle.entries()?;
    println!("bundle {} ({} entries):", bundle.root().display(), entries.len());
    for entry in entries {
        let suffix = if entry.kind == AssetKind::Dir { "/" } else { "" };
        println!("  {}{suffix}", entry.path.display());
    }

    debug!("dry-run complete (nothing launched)");
    Ok(())
}
