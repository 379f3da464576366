//! Ownership of the streaming server's OS process.
//!
//! A [`ProcessHandle`] moves through `NotStarted -> Running -> Stopped`. It is
//! the only owner of its child: nothing else signals or reaps it. Dropping the
//! handle runs [`ProcessHandle::shutdown`], so a fixture bound to a local
//! variable cannot outlive the test scope, whether the scope ends normally,
//! through `?`, or by unwinding.
//!
//! Each handle is independent. Tests that want several servers hold several
//! handles.

pub mod liveness;

use crate::args::ArgumentList;
use crate::config::launch::absolutize;
use crate::error::launch::LaunchError;
use crate::process::liveness::send_terminate;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout as TokioTimeout;

const REAP_INITIAL_INTERVAL: Duration = Duration::from_millis(10);
const REAP_MAX_INTERVAL: Duration = Duration::from_millis(250);
const REAP_MAX_ELAPSED: Duration = Duration::from_secs(5);
const UNKNOWN_COMMAND: &str = "<not started>";

/// Where the child's stdout and stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoMode {
    /// Share the parent's stdout/stderr.
    Inherit,
    /// Send both streams to the null device.
    #[default]
    Discard,
}

impl IoMode {
    /// Verbose servers inherit the parent's streams; quiet ones are discarded.
    pub fn for_verbosity(verbose: bool) -> Self {
        if verbose {
            IoMode::Inherit
        } else {
            IoMode::Discard
        }
    }

    fn stdio(self) -> Stdio {
        match self {
            IoMode::Inherit => Stdio::inherit(),
            IoMode::Discard => Stdio::null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    NotStarted,
    Running,
    Stopped,
}

impl Display for ProcessState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ProcessState::NotStarted => "not started",
            ProcessState::Running => "running",
            ProcessState::Stopped => "stopped",
        };
        write!(formatter, "{name}")
    }
}

/// Exclusive owner of one server process.
#[derive(Debug, Default)]
pub struct ProcessHandle {
    child: Option<TokioChild>,
    state: ProcessState,
    pid: Option<u32>,
    command_line: Option<String>,
}

/// `program` replaces the list's first token, which may be relative to the
/// caller rather than to `working_directory`.
pub(crate) fn build_command(
    program: &Path,
    arguments: &ArgumentList,
    working_directory: &Path,
    io_mode: IoMode,
) -> TokioCommand {
    let mut cmd = TokioCommand::new(program);
    cmd.args(arguments.args())
        .current_dir(working_directory)
        .stdin(Stdio::null())
        .stdout(io_mode.stdio())
        .stderr(io_mode.stdio())
        .kill_on_drop(true);
    cmd
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// PID of the current or most recent child.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Space-joined argv of the current or most recent launch.
    pub fn command_line(&self) -> &str {
        self.command_line.as_deref().unwrap_or(UNKNOWN_COMMAND)
    }

    /// Whether the owned child has not exited yet.
    ///
    /// This only reflects the OS process. The handle stays `Running` until
    /// [`shutdown`](Self::shutdown) even if the server exits on its own.
    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut().map(TokioChild::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                trace!("[{}] already exited with {status}", self.command_line());
                false
            }
            Some(Err(e)) => {
                warn!("Failed to poll [{}]: {e}", self.command_line());
                false
            }
            None => false,
        }
    }

    /// Start the server process.
    ///
    /// Must be called inside a Tokio runtime. Returns as soon as the OS has
    /// created the process; it does not wait for the server to accept clients.
    /// A relative executable path is taken relative to the current directory,
    /// not to `working_directory`.
    ///
    /// # Errors
    ///
    /// * [`LaunchError::AlreadyRunning`] - the handle already owns a live launch
    /// * [`LaunchError::WorkingDirectory`] - `working_directory` is not a directory
    /// * [`LaunchError::Executable`] - the executable path cannot be made absolute
    /// * [`LaunchError::Spawn`] - the OS refused to start the executable
    ///
    /// On error the handle keeps its previous state and owns no process.
    #[track_caller]
    pub fn launch(
        &mut self,
        arguments: &ArgumentList,
        working_directory: &Path,
        io_mode: IoMode,
    ) -> Result<(), LaunchError> {
        let location = ErrorLocation::from(Location::caller());
        let command_line = arguments.to_string();

        if self.state == ProcessState::Running {
            return Err(LaunchError::AlreadyRunning {
                message: format!(
                    "Cannot launch [{command_line}], handle already owns [{}]",
                    self.command_line()
                ),
                location,
            });
        }

        if !working_directory.is_dir() {
            return Err(LaunchError::WorkingDirectory {
                message: format!(
                    "Working directory {} does not exist or is not a directory",
                    working_directory.display()
                ),
                location,
                path: working_directory.to_path_buf(),
            });
        }

        if io_mode == IoMode::Inherit {
            debug!("Inheriting IO for [{command_line}]");
        }

        let program = absolutize(Path::new(arguments.program())).map_err(|e| {
            LaunchError::Executable {
                message: format!(
                    "Failed to resolve executable path {}: {e}",
                    arguments.program()
                ),
                location,
                source: e,
            }
        })?;

        let child = build_command(&program, arguments, working_directory, io_mode)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                message: format!("Failed to spawn [{command_line}]: {e}"),
                location,
                source: e,
            })?;

        self.pid = child.id();
        info!("Started [{command_line}] (PID: {:?})", self.pid);

        self.child = Some(child);
        self.command_line = Some(command_line);
        self.state = ProcessState::Running;

        Ok(())
    }

    /// Kill the server and release it.
    ///
    /// No-op unless the handle is `Running`. The kill is forceful; the child
    /// is then reaped with a bounded backoff so this never blocks for longer
    /// than a few seconds. Always leaves the handle `Stopped`.
    ///
    /// This blocks the calling thread while reaping. Async callers should
    /// prefer [`stop_gracefully`](Self::stop_gracefully).
    pub fn shutdown(&mut self) {
        let Some(mut child) = self.take_killed_child() else {
            return;
        };

        match reap(&mut child) {
            Some(status) => debug!("[{}] exited with {status}", self.command_line()),
            None => warn!(
                "[{}] (PID: {:?}) not reaped within {REAP_MAX_ELAPSED:?}",
                self.command_line(),
                self.pid
            ),
        }

        self.mark_stopped();
    }

    /// Ask the server to exit, then force it after `grace`.
    ///
    /// Sends a terminate signal where the platform supports one, waits up to
    /// `grace` for the child to exit, then kills it. Every wait here yields
    /// to the runtime. Ends `Stopped` like `shutdown` does.
    pub async fn stop_gracefully(&mut self, grace: Duration) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        let terminated = match child.id() {
            Some(pid) => send_terminate(pid),
            None => false,
        };

        if terminated {
            match TokioTimeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!("[{}] exited with {status}", self.command_line());
                    self.child = None;
                    self.mark_stopped();
                    return;
                }
                Ok(Err(e)) => warn!("Failed waiting on [{}]: {e}", self.command_line()),
                Err(_) => debug!(
                    "[{}] still running after {grace:?}, forcing",
                    self.command_line()
                ),
            }
        }

        let Some(mut child) = self.take_killed_child() else {
            return;
        };

        match TokioTimeout(REAP_MAX_ELAPSED, child.wait()).await {
            Ok(Ok(status)) => debug!("[{}] exited with {status}", self.command_line()),
            Ok(Err(e)) => warn!("Failed to reap [{}]: {e}", self.command_line()),
            Err(_) => warn!(
                "[{}] (PID: {:?}) not reaped within {REAP_MAX_ELAPSED:?}",
                self.command_line(),
                self.pid
            ),
        }

        self.mark_stopped();
    }

    fn take_killed_child(&mut self) -> Option<TokioChild> {
        let mut child = self.child.take()?;

        if let Err(e) = child.start_kill() {
            // Usually means the child exited and was reaped already.
            debug!("Kill of [{}] not delivered: {e}", self.command_line());
        }

        Some(child)
    }

    fn mark_stopped(&mut self) {
        self.state = ProcessState::Stopped;
        info!("Stopped [{}]", self.command_line());
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reap(child: &mut TokioChild) -> Option<ExitStatus> {
    let mut backoff = ExponentialBackoff {
        current_interval: REAP_INITIAL_INTERVAL,
        initial_interval: REAP_INITIAL_INTERVAL,
        max_interval: REAP_MAX_INTERVAL,
        max_elapsed_time: Some(REAP_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to reap child: {e}");
                return None;
            }
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Child not reaped yet, retrying after {duration:?}");
                sleep(duration);
            }
            None => return None,
        }
    }
}
