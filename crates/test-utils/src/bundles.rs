//! Agent bundles for tests.
//!
//! The mock agent is a `/bin/sh` script, so everything that launches it is
//! Unix-only. The health endpoint is served separately by
//! [`crate::MockHealthServer`].

use std::path::{Path, PathBuf};

use sidecar::assets::MemorySource;
use sidecar::exec::{UNAVAILABLE_MARKER, agent_binary_name};

/// What the mock agent does when it receives `SIGINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnInterrupt {
    /// Exit with status 0.
    ExitCleanly,
    /// Exit with the given status.
    ExitWith(i32),
    /// Keep running; only a kill stops it.
    Ignore,
}

/// Builder for a bundle whose binary is a shell-script agent.
#[derive(Debug, Clone)]
pub struct MockAgent {
    on_interrupt: OnInterrupt,
    signal_log: Option<PathBuf>,
    env_log: Option<PathBuf>,
    ready_marker: Option<PathBuf>,
    exit_on_start: Option<i32>,
    extra_files: Vec<(String, Vec<u8>)>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            on_interrupt: OnInterrupt::ExitCleanly,
            signal_log: None,
            env_log: None,
            ready_marker: None,
            exit_on_start: None,
            extra_files: Vec::new(),
        }
    }

    pub fn on_interrupt(mut self, behaviour: OnInterrupt) -> Self {
        self.on_interrupt = behaviour;
        self
    }

    /// Append one line to `path` every time the agent receives `SIGINT`.
    pub fn record_signals_to(mut self, path: &Path) -> Self {
        self.signal_log = Some(path.to_path_buf());
        self
    }

    /// Write the working directory and both config env vars to `path` at
    /// startup, one per line.
    pub fn record_env_to(mut self, path: &Path) -> Self {
        self.env_log = Some(path.to_path_buf());
        self
    }

    /// Create `path` once the interrupt handler is installed.
    pub fn ready_marker(mut self, path: &Path) -> Self {
        self.ready_marker = Some(path.to_path_buf());
        self
    }

    /// Exit immediately with `code` instead of running.
    pub fn exit_on_start(mut self, code: i32) -> Self {
        self.exit_on_start = Some(code);
        self
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.extra_files.push((path.to_string(), contents.into()));
        self
    }

    pub fn script(&self) -> String {
        let mut s = String::from("#!/bin/sh\n");

        let record = match &self.signal_log {
            Some(path) => format!("echo interrupted >> \"{}\"; ", path.display()),
            None => String::new(),
        };
        match self.on_interrupt {
            OnInterrupt::ExitCleanly => s.push_str(&format!("trap '{record}exit 0' INT\n")),
            OnInterrupt::ExitWith(code) => {
                s.push_str(&format!("trap '{record}exit {code}' INT\n"))
            }
            OnInterrupt::Ignore => match &self.signal_log {
                Some(_) => s.push_str(&format!("trap '{record}' INT\n")),
                None => s.push_str("trap '' INT\n"),
            },
        }

        if let Some(path) = &self.env_log {
            let p = path.display();
            s.push_str(&format!("pwd > '{p}'\n"));
            s.push_str(&format!("echo \"$SIDECAR_CONFIG_PATH\" >> '{p}'\n"));
            s.push_str(&format!("echo \"$CONFIG_PATH\" >> '{p}'\n"));
        }

        if let Some(path) = &self.ready_marker {
            s.push_str(&format!("touch '{}'\n", path.display()));
        }

        if let Some(code) = self.exit_on_start {
            s.push_str(&format!("echo 'mock agent exiting with {code}' 1>&2\nexit {code}\n"));
            return s;
        }

        s.push_str("echo 'mock agent up'\n");
        s.push_str("printf 'partial line without newline'\n");
        s.push_str("echo 'mock agent warning' 1>&2\n");
        s.push_str("while :; do sleep 0.05; done\n");
        s
    }

    pub fn build(self) -> MemorySource {
        let mut bundle = MemorySource::new()
            .with_file(&agent_binary_name(), self.script())
            .with_file("static/README.txt", "support file\n");
        for (path, contents) in self.extra_files {
            bundle = bundle.with_file(&path, contents);
        }
        bundle
    }
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Bundle for a platform without an agent build: marker file, no binary.
pub fn unavailable_bundle() -> MemorySource {
    MemorySource::new()
        .with_file(UNAVAILABLE_MARKER, "no agent build for this platform\n")
        .with_file("static/README.txt", "support file\n")
}
