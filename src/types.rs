use std::fmt;

/// Lifecycle of a single `Supervisor` instance.
///
/// ```text
/// NotStarted -> Starting -> Healthy     -> Stopping -> Stopped
///                        -> Unavailable -> Stopping -> Stopped
///                        -> Failed
/// ```
///
/// `Failed` is terminal: a supervisor whose `start` returned an error is not
/// reusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Starting,
    /// The agent process is running and answered its health endpoint.
    Healthy,
    /// No binary is bundled for this platform; no process is managed.
    Unavailable,
    Stopping,
    Stopped,
    Failed,
}

impl LifecycleState {
    /// Whether `stop` has begun or finished.
    pub fn is_shutting_down(self) -> bool {
        matches!(self, LifecycleState::Stopping | LifecycleState::Stopped)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::NotStarted => "not-started",
            LifecycleState::Starting => "starting",
            LifecycleState::Healthy => "healthy",
            LifecycleState::Unavailable => "unavailable",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Which output stream of the agent process a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    /// Fixed severity for lines read from this stream.
    pub fn level(self) -> tracing::Level {
        match self {
            OutputStream::Stdout => tracing::Level::INFO,
            OutputStream::Stderr => tracing::Level::ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}
