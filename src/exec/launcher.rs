// src/exec/launcher.rs

//! Launch the bundled agent binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CONFIG_PATH_ENV_VARS;
use crate::errors::{Result, SidecarError};
use crate::exec::log_forward::spawn_output_pump;
use crate::types::OutputStream;

/// Base file name of the agent binary inside the bundle.
pub const AGENT_BIN_NAME: &str = "agent-bin";

/// Marker file shipped instead of the binary on platforms without an agent
/// build.
pub const UNAVAILABLE_MARKER: &str = "UNAVAILABLE";

const SPAWN_BUSY_RETRIES: u32 = 5;
const SPAWN_BUSY_BACKOFF: Duration = Duration::from_millis(20);

/// Platform-specific binary name (`agent-bin`, or `agent-bin.exe` on Windows).
pub fn agent_binary_name() -> String {
    format!("{AGENT_BIN_NAME}{}", std::env::consts::EXE_SUFFIX)
}

/// `os/arch` of the running host, e.g. `linux/x86_64`.
pub fn runtime_platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// What the bundle provides for this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentBinary {
    /// Absolute path of the binary to run.
    Present(PathBuf),
    /// No binary, but the bundle says so explicitly via the marker file.
    Unavailable,
}

/// Locate the agent binary in an extracted bundle.
///
/// - binary present → [`AgentBinary::Present`]
/// - binary absent, marker present → [`AgentBinary::Unavailable`]
/// - binary absent, no marker → [`SidecarError::BinaryMissing`]
pub fn resolve_agent_binary(bundle_root: &Path) -> Result<AgentBinary> {
    let path = bundle_root.join(agent_binary_name());
    match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(AgentBinary::Present(path)),
        Ok(_) => Err(SidecarError::BinaryMissing { path }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if bundle_root.join(UNAVAILABLE_MARKER).is_file() {
                Ok(AgentBinary::Unavailable)
            } else {
                Err(SidecarError::BinaryMissing { path })
            }
        }
        Err(e) => Err(SidecarError::IoError(e)),
    }
}

/// A running agent process.
///
/// Stdout and stderr are drained by the `pumps` tasks; they end on their own
/// once the process closes its pipes.
#[derive(Debug)]
pub struct ManagedProcess {
    pub child: Child,
    pub pid: u32,
    pub workdir: PathBuf,
    pub pumps: Vec<JoinHandle<()>>,
}

impl ManagedProcess {
    /// Ask the agent to shut down gracefully.
    ///
    /// On Unix this is `SIGINT`. Other platforms have no equivalent for a
    /// detached child, so the process is killed.
    pub fn interrupt(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            let rc = unsafe { libc::kill(self.pid as libc::pid_t, libc::SIGINT) };
            if rc == -1 {
                return Err(io::Error::last_os_error());
            }
            return Ok(());
        }
        #[cfg(not(unix))]
        {
            return self.child.start_kill();
        }
    }
}

/// Mark `binary` executable and spawn it.
///
/// The child runs in `bundle_root`, inherits the parent environment plus
/// [`CONFIG_PATH_ENV_VARS`] pointing at `config_path`, and has its output
/// forwarded to the log (stdout at INFO, stderr at ERROR). It is killed if
/// the handle is dropped.
pub async fn launch_agent(
    binary: &Path,
    bundle_root: &Path,
    config_path: &Path,
) -> Result<ManagedProcess> {
    make_executable(binary)?;

    let mut cmd = Command::new(binary);
    cmd.current_dir(bundle_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for key in CONFIG_PATH_ENV_VARS {
        cmd.env(key, config_path);
    }

    let mut child = spawn_with_retry(&mut cmd).await.map_err(SidecarError::Spawn)?;
    let pid = child.id().ok_or_else(|| {
        SidecarError::Spawn(io::Error::other("agent exited before its pid was read"))
    })?;

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_output_pump(stdout, OutputStream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_output_pump(stderr, OutputStream::Stderr));
    }

    info!(pid, binary = ?binary, "agent process spawned");

    Ok(ManagedProcess {
        child,
        pid,
        workdir: bundle_root.to_path_buf(),
        pumps,
    })
}

fn make_executable(binary: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(binary, fs::Permissions::from_mode(0o755)).map_err(|source| {
            SidecarError::Chmod {
                path: binary.to_path_buf(),
                source,
            }
        })?;
    }
    #[cfg(not(unix))]
    let _ = binary;
    Ok(())
}

// A freshly written binary can still be open for writing in a child forked
// concurrently by another thread; exec then fails with ETXTBSY until that
// child execs or exits.
async fn spawn_with_retry(cmd: &mut Command) -> io::Result<Child> {
    let mut attempt = 0;
    loop {
        match cmd.spawn() {
            Err(e) if is_text_file_busy(&e) && attempt < SPAWN_BUSY_RETRIES => {
                attempt += 1;
                debug!(attempt, "agent binary busy; retrying spawn");
                tokio::time::sleep(SPAWN_BUSY_BACKOFF).await;
            }
            Err(e) => {
                warn!(error = %e, "failed to spawn agent process");
                return Err(e);
            }
            Ok(child) => return Ok(child),
        }
    }
}

#[cfg(unix)]
fn is_text_file_busy(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::ETXTBSY)
}

#[cfg(not(unix))]
fn is_text_file_busy(_e: &io::Error) -> bool {
    false
}
