use crate::helpers::{StubServer, poll_until, wait_until_gone, write_executable};

use fixture_core::args::ArgumentList;
use fixture_core::error::launch::LaunchError;
use fixture_core::process::liveness::is_pid_alive;
use fixture_core::process::{IoMode, ProcessHandle, ProcessState};

use std::fs::{Permissions, canonicalize, set_permissions};
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use serial_test::serial;

// ============================================================================
// Public API tests for ProcessHandle
// These launch a stub executable in place of the real streaming server
// ============================================================================

fn stub_arguments(stub: &StubServer) -> ArgumentList {
    let mut arguments = ArgumentList::new(&stub.executable);
    arguments
        .push_flag("-cluster_id", "test cluster")
        .push_flag("-p", "4333");
    arguments
}

// ----------------------------------------------------------------------------
// launch() / shutdown() lifecycle
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies the full NotStarted -> Running -> Stopped lifecycle against a real OS process.
///
/// **WHY THIS MATTERS**: This is the core contract of the fixture. The process the OS runs must
/// receive exactly our argv and working directory, and must be gone after shutdown.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Argument tokens being re-split or re-joined before reaching the OS
/// - `current_dir` not being applied
/// - Shutdown leaving the child running or unreaped
#[tokio::test]
#[serial]
async fn given_stub_server_when_launched_and_shut_down_then_lifecycle_completes() {
    // GIVEN: A stub server and a fresh handle
    let stub = StubServer::new();
    let arguments = stub_arguments(&stub);
    let mut handle = ProcessHandle::new();

    // WHEN: Launching
    handle
        .launch(&arguments, &stub.working_directory, IoMode::Discard)
        .expect("Launch should succeed");

    // THEN: Running with a live PID and the exact argv / cwd
    assert_eq!(handle.state(), ProcessState::Running);
    let pid = handle.pid().expect("Running handle should have a PID");
    assert!(handle.is_alive(), "Child should be alive after launch");
    assert_eq!(
        stub.recorded_argv().await,
        vec!["-cluster_id", "test cluster", "-p", "4333"]
    );
    assert_eq!(
        stub.recorded_cwd().await,
        canonicalize(&stub.working_directory).unwrap()
    );
    assert_eq!(handle.command_line(), arguments.to_string());

    // WHEN: Shutting down
    handle.shutdown();

    // THEN: Stopped and the OS process is gone
    assert_eq!(handle.state(), ProcessState::Stopped);
    assert!(!handle.is_alive());
    assert!(wait_until_gone(pid).await, "PID {pid} should be gone");
}

/// **VALUE**: Verifies shutdown is idempotent.
///
/// **WHY THIS MATTERS**: Tests often shut down explicitly and then drop the handle, which shuts
/// down again. The second call must be silent.
///
/// **BUG THIS CATCHES**: Would catch a second kill attempt panicking, or the state regressing.
#[tokio::test]
#[serial]
async fn given_running_handle_when_shutdown_called_twice_then_stays_stopped() {
    // GIVEN: A running stub
    let stub = StubServer::new();
    let mut handle = ProcessHandle::new();
    handle
        .launch(&stub_arguments(&stub), &stub.working_directory, IoMode::Discard)
        .unwrap();

    // WHEN: Shutting down twice
    handle.shutdown();
    assert_eq!(handle.state(), ProcessState::Stopped);
    handle.shutdown();

    // THEN: Still Stopped
    assert_eq!(handle.state(), ProcessState::Stopped);
}

/// **VALUE**: Verifies launching an already-running handle is rejected and leaves the
/// original process alone.
///
/// **WHY THIS MATTERS**: Silently replacing the child would orphan the first server. It would
/// keep its port bound and break every later test.
///
/// **BUG THIS CATCHES**: Would catch launch overwriting `child` without a state check.
#[tokio::test]
#[serial]
async fn given_running_handle_when_launched_again_then_returns_already_running() {
    // GIVEN: A running stub
    let stub = StubServer::new();
    let arguments = stub_arguments(&stub);
    let mut handle = ProcessHandle::new();
    handle
        .launch(&arguments, &stub.working_directory, IoMode::Discard)
        .unwrap();
    let pid = handle.pid().unwrap();

    // WHEN: Launching again
    let result = handle.launch(&arguments, &stub.working_directory, IoMode::Discard);

    // THEN: AlreadyRunning, original child untouched
    assert!(matches!(result, Err(LaunchError::AlreadyRunning { .. })));
    assert_eq!(handle.state(), ProcessState::Running);
    assert_eq!(handle.pid(), Some(pid));
    assert!(is_pid_alive(pid), "Original child should still be alive");
}

/// **VALUE**: Verifies a stopped handle can be launched again.
///
/// **WHY THIS MATTERS**: Reconnect tests stop the server and start it again on the same
/// fixture to check that clients recover.
///
/// **BUG THIS CATCHES**: Would catch `Stopped` being treated as terminal, or the old PID
/// being reported for the new child.
#[tokio::test]
#[serial]
async fn given_stopped_handle_when_launched_again_then_runs_new_process() {
    // GIVEN: A handle that has been started and stopped
    let stub = StubServer::new();
    let arguments = stub_arguments(&stub);
    let mut handle = ProcessHandle::new();
    handle
        .launch(&arguments, &stub.working_directory, IoMode::Discard)
        .unwrap();
    let first_pid = handle.pid().unwrap();
    handle.shutdown();

    // WHEN: Launching again
    handle
        .launch(&arguments, &stub.working_directory, IoMode::Discard)
        .expect("Relaunch should succeed");

    // THEN: Running with a different live PID
    let second_pid = handle.pid().unwrap();
    assert_eq!(handle.state(), ProcessState::Running);
    assert_ne!(first_pid, second_pid);
    assert!(handle.is_alive());

    handle.shutdown();
    assert!(wait_until_gone(second_pid).await);
}

/// **VALUE**: Verifies a child that exits on its own is reported as not alive while the
/// handle stays `Running` until shutdown.
///
/// **WHY THIS MATTERS**: A server that crashes on a bad flag must not leave the handle
/// claiming a live process, but teardown still has to run normally.
///
/// **BUG THIS CATCHES**: Would catch `is_alive()` only checking state, or shutdown
/// failing on an already-exited child.
#[tokio::test]
#[serial]
async fn given_child_that_exits_when_polled_then_not_alive_and_shutdown_is_clean() {
    // GIVEN: A child that exits immediately
    let stub = StubServer::new();
    let mut arguments = ArgumentList::new("/bin/sh");
    arguments.push_flag("-c", "exit 3");
    let mut handle = ProcessHandle::new();
    handle
        .launch(&arguments, &stub.working_directory, IoMode::Discard)
        .unwrap();

    // WHEN: Polling until it has exited
    let exited = poll_until(|| !handle.is_alive()).await;

    // THEN: Not alive, still Running until shutdown, and shutdown is clean
    assert!(exited, "Child should exit on its own");
    assert_eq!(handle.state(), ProcessState::Running);
    handle.shutdown();
    assert_eq!(handle.state(), ProcessState::Stopped);
}

// ----------------------------------------------------------------------------
// launch() failures
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies a missing executable surfaces a Spawn error carrying the OS error.
///
/// **WHY THIS MATTERS**: Forgetting to build the server is the most common failure. The test
/// must fail with "not found", not hang waiting for a server that never started.
///
/// **BUG THIS CATCHES**: Would catch spawn errors being logged and swallowed, or the handle
/// moving to `Running` without a child.
#[tokio::test]
#[serial]
async fn given_missing_executable_when_launch_called_then_returns_spawn_error() {
    // GIVEN: An executable that does not exist
    let stub = StubServer::new();
    let arguments = ArgumentList::new(stub.working_directory.join("no-such-server"));
    let mut handle = ProcessHandle::new();

    // WHEN: Launching
    let result = handle.launch(&arguments, &stub.working_directory, IoMode::Discard);

    // THEN: Spawn error with NotFound source, handle unstarted
    match result {
        Err(LaunchError::Spawn { source, .. }) => assert_eq!(source.kind(), ErrorKind::NotFound),
        other => panic!("Expected Spawn error, got {other:?}"),
    }
    assert_eq!(handle.state(), ProcessState::NotStarted);
    assert_eq!(handle.pid(), None);
}

/// **VALUE**: Verifies a file without execute permission surfaces PermissionDenied.
///
/// **WHY THIS MATTERS**: Downloaded server binaries frequently lose their executable bit.
///
/// **BUG THIS CATCHES**: Would catch permission errors being mapped to a generic message
/// without the underlying OS error.
#[tokio::test]
#[serial]
async fn given_non_executable_file_when_launch_called_then_returns_permission_error() {
    // GIVEN: A script with mode 0644
    let stub = StubServer::new();
    let script = stub.working_directory.join("not-executable");
    write_executable(&script, "#!/bin/sh\nexit 0\n");
    set_permissions(&script, Permissions::from_mode(0o644)).unwrap();
    let mut handle = ProcessHandle::new();

    // WHEN: Launching it
    let result = handle.launch(
        &ArgumentList::new(&script),
        &stub.working_directory,
        IoMode::Discard,
    );

    // THEN: Spawn error with PermissionDenied
    match result {
        Err(LaunchError::Spawn { source, .. }) => {
            assert_eq!(source.kind(), ErrorKind::PermissionDenied)
        }
        other => panic!("Expected Spawn error, got {other:?}"),
    }
    assert_eq!(handle.state(), ProcessState::NotStarted);
}

/// **VALUE**: Verifies a missing working directory is reported as such.
///
/// **WHY THIS MATTERS**: The server runs from the build output directory, which may not
/// exist on a clean checkout.
///
/// **BUG THIS CATCHES**: Would catch the pre-spawn directory check being removed.
#[tokio::test]
#[serial]
async fn given_missing_working_directory_when_launch_called_then_returns_error() {
    let stub = StubServer::new();
    let mut handle = ProcessHandle::new();
    let missing = stub.working_directory.join("missing");

    let result = handle.launch(&stub_arguments(&stub), &missing, IoMode::Discard);

    assert!(matches!(
        result,
        Err(LaunchError::WorkingDirectory { ref path, .. }) if *path == missing
    ));
    assert_eq!(handle.state(), ProcessState::NotStarted);
}

// ----------------------------------------------------------------------------
// stop_gracefully()
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies graceful stop ends a cooperative server with SIGTERM.
///
/// **WHY THIS MATTERS**: Servers that flush state on SIGTERM should get the chance to do so
/// when the caller can afford to wait.
///
/// **BUG THIS CATCHES**: Would catch graceful stop leaving the handle `Running` or the PID alive.
#[tokio::test]
#[serial]
async fn given_cooperative_server_when_stopped_gracefully_then_stopped_and_gone() {
    // GIVEN: A running stub that exits on SIGTERM
    let stub = StubServer::new();
    let mut handle = ProcessHandle::new();
    handle
        .launch(&stub_arguments(&stub), &stub.working_directory, IoMode::Discard)
        .unwrap();
    stub.recorded_argv().await;
    let pid = handle.pid().unwrap();

    // WHEN: Stopping gracefully
    handle.stop_gracefully(Duration::from_secs(5)).await;

    // THEN: Stopped and gone
    assert_eq!(handle.state(), ProcessState::Stopped);
    assert!(wait_until_gone(pid).await);
}

/// **VALUE**: Verifies graceful stop escalates to a kill when SIGTERM is ignored.
///
/// **WHY THIS MATTERS**: A wedged server must never hang teardown. The grace period is an
/// upper bound, not a hope.
///
/// **BUG THIS CATCHES**: Would catch graceful stop waiting forever, or returning without
/// falling back to a kill.
#[tokio::test]
#[serial]
async fn given_server_ignoring_sigterm_when_stopped_gracefully_then_killed_after_grace() {
    // GIVEN: A running stub that ignores SIGTERM
    let stub = StubServer::ignoring_term();
    let mut handle = ProcessHandle::new();
    handle
        .launch(&stub_arguments(&stub), &stub.working_directory, IoMode::Discard)
        .unwrap();
    stub.recorded_argv().await;
    let pid = handle.pid().unwrap();

    // WHEN: Stopping with a short grace period
    let stopped = tokio::time::timeout(
        Duration::from_secs(10),
        handle.stop_gracefully(Duration::from_millis(200)),
    )
    .await;

    // THEN: Returned in bounded time, Stopped and gone
    assert!(stopped.is_ok(), "Graceful stop must be bounded");
    assert_eq!(handle.state(), ProcessState::Stopped);
    assert!(wait_until_gone(pid).await);
}

/// **VALUE**: Verifies the kill fallback of graceful stop leaves the runtime free.
///
/// **WHY THIS MATTERS**: `#[tokio::test]` runs on one thread. A blocking reap there stalls
/// every other task, including timeouts that are meant to bound teardown.
///
/// **BUG THIS CATCHES**: Would catch the async path reaping with thread sleeps instead of
/// awaiting the child.
#[tokio::test(flavor = "current_thread")]
#[serial]
async fn given_single_thread_runtime_when_graceful_stop_escalates_then_other_tasks_progress() {
    // GIVEN: A SIGTERM-ignoring stub and a ticking background task
    let stub = StubServer::ignoring_term();
    let mut handle = ProcessHandle::new();
    handle
        .launch(&stub_arguments(&stub), &stub.working_directory, IoMode::Discard)
        .unwrap();
    stub.recorded_argv().await;

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    // WHEN: Escalating after a short grace
    handle.stop_gracefully(Duration::from_millis(100)).await;
    ticker.abort();

    // THEN: Stopped, and the ticker ran while we waited
    assert_eq!(handle.state(), ProcessState::Stopped);
    assert!(
        ticks.load(Ordering::SeqCst) >= 5,
        "Background task starved: {} ticks",
        ticks.load(Ordering::SeqCst)
    );
}
