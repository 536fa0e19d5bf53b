// src/supervisor/mod.rs

//! Lifecycle of the bundled agent.
//!
//! `start` materializes the bundle into a fresh temporary workspace, writes
//! the agent config, launches the agent and waits for it to become healthy.
//! `stop` terminates it (interrupt, then kill on cancellation or timeout)
//! and removes the workspace. The shutdown runs at most once per instance on
//! its own task, so dropping a `stop` future never abandons it halfway; every
//! caller gets the outcome of that one run.

mod shutdown;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tempfile::TempDir;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetSource, extract_tree};
use crate::config::{AGENT_CONFIG_FILE_NAME, RuntimeConfig, SupervisorOptions, write_agent_config};
use crate::errors::{Result, SidecarError, StopError};
use crate::exec::{
    AgentBinary, ManagedProcess, launch_agent, resolve_agent_binary, runtime_platform,
};
use crate::health::HealthProber;
use crate::types::LifecycleState;

type StopOutcome = std::result::Result<(), StopError>;

/// Directory inside the workspace that holds the extracted bundle.
pub const BUNDLE_DIR_NAME: &str = "agent";

/// Supervises one bundled agent process.
///
/// `start` takes `&mut self` and `stop` takes `&self`, so a started
/// supervisor can be shared (e.g. behind an `Arc`) and stopped from several
/// tasks at once.
pub struct Supervisor {
    runtime: RuntimeConfig,
    options: SupervisorOptions,
    assets: Arc<dyn AssetSource>,
    state: Arc<Mutex<LifecycleState>>,
    workspace: Mutex<Option<TempDir>>,
    workspace_path: Option<PathBuf>,
    bundle_root: Option<PathBuf>,
    process: Mutex<Option<ManagedProcess>>,
    pid: Option<u32>,
    /// Set by the first `stop`; resolves to `Some` once shutdown finished.
    stop_outcome: Mutex<Option<watch::Receiver<Option<StopOutcome>>>>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("address", &self.runtime.address())
            .field("workspace", &self.workspace_path)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        runtime: RuntimeConfig,
        assets: Arc<dyn AssetSource>,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            runtime,
            options,
            assets,
            state: Arc::new(Mutex::new(LifecycleState::NotStarted)),
            workspace: Mutex::new(None),
            workspace_path: None,
            bundle_root: None,
            process: Mutex::new(None),
            pid: None,
            stop_outcome: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    /// Pid of the managed agent, if one was launched.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Temporary directory created by `start`. It no longer exists once
    /// `stop` has finished or `start` has failed.
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }

    /// Root of the extracted bundle (binary, support files, `config.toml`).
    pub fn bundle_root(&self) -> Option<&Path> {
        self.bundle_root.as_deref()
    }

    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// `host:port` the agent is expected to listen on. In the unavailable
    /// state this is the externally provided agent endpoint.
    pub fn address(&self) -> String {
        self.runtime.address()
    }

    pub fn health_url(&self) -> String {
        format!("http://{}{}", self.address(), crate::health::HEALTH_PATH)
    }

    /// Bring the agent up.
    ///
    /// Steps run strictly in order: extract bundle, write config, launch,
    /// wait for health. Returns `Ok(())` once the agent is healthy, or when
    /// this platform has no bundled agent (state [`LifecycleState::Unavailable`]).
    ///
    /// On error the launched process (if any) is killed, the workspace is
    /// removed and the supervisor ends in [`LifecycleState::Failed`].
    pub async fn start(&mut self, cancel: &CancellationToken) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if *state != LifecycleState::NotStarted {
                return Err(SidecarError::AlreadyStarted);
            }
            *state = LifecycleState::Starting;
        }

        match self.run_start(cancel).await {
            Ok(reached) => {
                self.set_state(reached);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "bundled agent runtime failed to start");
                self.abort_start().await;
                self.set_state(LifecycleState::Failed);
                Err(err)
            }
        }
    }

    async fn run_start(&mut self, cancel: &CancellationToken) -> Result<LifecycleState> {
        let workspace = tempfile::Builder::new()
            .prefix(&self.options.workspace_prefix)
            .tempdir()
            .map_err(SidecarError::Workspace)?;
        let bundle_root = workspace.path().join(BUNDLE_DIR_NAME);
        self.workspace_path = Some(workspace.path().to_path_buf());
        self.bundle_root = Some(bundle_root.clone());
        *self.workspace.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(workspace);

        // 1. Bundle.
        let assets = Arc::clone(&self.assets);
        let dest = bundle_root.clone();
        let files = tokio::task::spawn_blocking(move || extract_tree(assets.as_ref(), &dest))
            .await
            .map_err(|e| SidecarError::Extract(e.into()))?
            .map_err(SidecarError::Extract)?;
        debug!(bundle = ?bundle_root, files, "agent bundle extracted");

        // 2. Config.
        let config_path = bundle_root.join(AGENT_CONFIG_FILE_NAME);
        write_agent_config(&config_path, &self.runtime)?;

        // 3. Launch.
        let binary = match resolve_agent_binary(&bundle_root)? {
            AgentBinary::Present(path) => path,
            AgentBinary::Unavailable => {
                warn!(
                    platform = %runtime_platform(),
                    addr = %self.address(),
                    "bundled agent binary unavailable for current platform; falling back to configured agent gateway"
                );
                return Ok(LifecycleState::Unavailable);
            }
        };

        let mut process = launch_agent(&binary, &bundle_root, &config_path).await?;
        self.pid = Some(process.pid);
        info!(pid = process.pid, addr = %self.address(), "bundled agent runtime started");

        // 4. Health.
        let prober = HealthProber::new(&self.address(), &self.options)?;
        let healthy = tokio::select! {
            res = prober.wait_healthy() => res,
            status = process.child.wait() => match status {
                Ok(status) => Err(SidecarError::AgentExitedEarly { status }),
                Err(e) => Err(SidecarError::IoError(e)),
            },
            _ = cancel.cancelled() => Err(SidecarError::Cancelled),
        };

        *self.process.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(process);
        healthy?;

        Ok(LifecycleState::Healthy)
    }

    async fn abort_start(&mut self) {
        let process = self
            .process
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut process) = process {
            if let Err(e) = process.child.start_kill() {
                debug!(pid = process.pid, error = %e, "agent already gone");
            }
            let _ = process.child.wait().await;
        }

        let workspace = self
            .workspace
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(workspace) = workspace {
            shutdown::remove_workspace(workspace);
        }
    }

    /// Shut the agent down and remove the workspace.
    ///
    /// Only the first call starts a shutdown. It runs on a spawned task and
    /// finishes even if every `stop` future is dropped. Concurrent and later
    /// calls wait for it and return a clone of its result.
    ///
    /// - no managed process: nothing to signal, the workspace is removed.
    /// - otherwise the agent gets an interrupt, then:
    ///   - exits → `Ok(())`, or [`StopError::AgentExited`] /
    ///     [`StopError::Wait`] if that exit was abnormal;
    ///   - `cancel` fires → the agent is killed and
    ///     [`StopError::Cancelled`] is returned right away;
    ///   - the stop timeout passes → the agent is killed and reaped,
    ///     `Ok(())`.
    ///
    /// `cancel` is only observed through the first call. The workspace is
    /// removed after any of these, exactly once.
    pub async fn stop(&self, cancel: &CancellationToken) -> StopOutcome {
        let mut outcome = {
            let mut slot = lock(&self.stop_outcome);
            match slot.as_ref() {
                Some(rx) => rx.clone(),
                None => {
                    let rx = self.begin_shutdown(cancel);
                    *slot = Some(rx.clone());
                    rx
                }
            }
        };

        let done = outcome
            .wait_for(Option::is_some)
            .await
            .map(|done| (*done).clone());
        match done {
            Ok(Some(result)) => result,
            Ok(None) | Err(_) => Err(StopError::Wait(Arc::new(std::io::Error::other(
                "shutdown task ended without reporting an outcome",
            )))),
        }
    }

    fn begin_shutdown(&self, cancel: &CancellationToken) -> watch::Receiver<Option<StopOutcome>> {
        {
            let mut state = lock(&self.state);
            if *state == LifecycleState::Failed {
                debug!("supervisor failed to start; nothing to stop");
                let (_, rx) = watch::channel(Some(Ok(())));
                return rx;
            }
            *state = LifecycleState::Stopping;
        }

        let process = lock(&self.process).take();
        let workspace = lock(&self.workspace).take();
        let state = Arc::clone(&self.state);
        let cancel = cancel.clone();
        let stop_timeout = self.options.stop_timeout;

        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            let result = match process {
                Some(process) => shutdown::terminate(process, &cancel, stop_timeout).await,
                None => {
                    debug!("no managed agent process; skipping termination");
                    Ok(())
                }
            };

            if let Some(workspace) = workspace {
                shutdown::remove_workspace(workspace);
            }

            set_state(&state, LifecycleState::Stopped);
            match &result {
                Ok(()) => info!("bundled agent runtime stopped"),
                Err(e) => warn!(error = %e, "bundled agent runtime stopped with error"),
            }
            tx.send_replace(Some(result));
        });
        rx
    }

    fn set_state(&self, next: LifecycleState) {
        set_state(&self.state, next);
    }
}

fn set_state(state: &Mutex<LifecycleState>, next: LifecycleState) {
    let mut state = lock(state);
    debug!(from = %*state, to = %next, "supervisor state change");
    *state = next;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
