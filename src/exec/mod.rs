// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] resolves the bundled agent binary for this platform and
//!   spawns it with the bundle as working directory.
//! - [`log_forward`] turns the agent's stdout/stderr bytes into log lines.

pub mod launcher;
pub mod log_forward;

pub use launcher::{
    AGENT_BIN_NAME, AgentBinary, ManagedProcess, UNAVAILABLE_MARKER, agent_binary_name,
    launch_agent, resolve_agent_binary, runtime_platform,
};
pub use log_forward::{LineBuffer, LogForwarder, MAX_LINE_BYTES};
