//! OS-level process probes by PID.
//!
//! Used to deliver the polite half of [`ProcessHandle::stop_gracefully`](super::ProcessHandle::stop_gracefully)
//! and by tests that need to prove a fixture really went away.

use log::{debug, trace};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, Signal, System};

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(f)
}

/// Check whether `pid` names a live process.
///
/// Zombies count as gone: they have exited and are only waiting to be reaped.
///
/// # Returns
///
/// * `true` - The process exists and has not exited
/// * `false` - No such process, or it is a zombie/dead entry
pub fn is_pid_alive(pid: u32) -> bool {
    with_process(pid, |p| {
        let status = p.status();
        trace!("PID {pid} status: {status:?}");
        !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
    })
    .unwrap_or(false)
}

/// Send SIGTERM (or the platform's equivalent) to `pid`.
///
/// Returns `false` when the process is missing or the platform has no
/// terminate signal, in which case the caller should kill outright.
pub(crate) fn send_terminate(pid: u32) -> bool {
    with_process(pid, |p| match p.kill_with(Signal::Term) {
        Some(sent) => {
            debug!("Sent SIGTERM to PID {pid}: success={sent}");
            sent
        }
        None => {
            debug!("SIGTERM not supported for PID {pid}");
            false
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    })
}
