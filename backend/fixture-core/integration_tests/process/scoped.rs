use crate::helpers::{StubServer, wait_until_gone};

use fixture_core::args::ArgumentList;
use fixture_core::error::launch::LaunchError;
use fixture_core::process::liveness::is_pid_alive;
use fixture_core::process::{IoMode, ProcessHandle};

use std::panic::{AssertUnwindSafe, catch_unwind};

use serial_test::serial;

// ============================================================================
// Scoped-release tests: the process must die with the handle on every exit path
// ============================================================================

fn launch_stub(stub: &StubServer) -> Result<ProcessHandle, LaunchError> {
    let mut handle = ProcessHandle::new();
    handle.launch(
        &ArgumentList::new(&stub.executable),
        &stub.working_directory,
        IoMode::Discard,
    )?;
    Ok(handle)
}

/// Launches the stub, records its PID, then fails on a second launch via `?`.
fn body_that_fails_after_launch(
    stub: &StubServer,
    observed_pid: &mut Option<u32>,
) -> Result<(), LaunchError> {
    let handle = launch_stub(stub)?;
    *observed_pid = handle.pid();

    let mut broken = ProcessHandle::new();
    broken.launch(
        &ArgumentList::new(stub.working_directory.join("missing-binary")),
        &stub.working_directory,
        IoMode::Discard,
    )?;

    unreachable!("second launch should have failed");
}

/// **VALUE**: Verifies dropping the handle at the end of a scope kills the process.
///
/// **WHY THIS MATTERS**: Most tests never call shutdown explicitly; they rely on the fixture
/// falling out of scope.
///
/// **BUG THIS CATCHES**: Would catch the `Drop` impl being removed or not calling shutdown.
#[tokio::test]
#[serial]
async fn given_running_handle_when_scope_ends_then_process_is_gone() {
    // GIVEN: A stub server
    let stub = StubServer::new();

    // WHEN: A scope launches and then ends normally
    let pid = {
        let handle = launch_stub(&stub).unwrap();
        handle.pid().unwrap()
    };

    // THEN: The process is gone
    assert!(wait_until_gone(pid).await, "PID {pid} should be gone");
}

/// **VALUE**: Verifies an error propagated with `?` still tears the process down.
///
/// **WHY THIS MATTERS**: A test that fails halfway through setup must not leave a server
/// bound to the port, or every later test fails with "address in use".
///
/// **BUG THIS CATCHES**: Would catch cleanup that only happens on the success path.
#[tokio::test]
#[serial]
async fn given_error_propagated_from_scope_when_scope_exits_then_process_is_gone() {
    // GIVEN: A body that launches and then fails
    let stub = StubServer::new();
    let mut observed_pid = None;

    // WHEN: Running it
    let result = body_that_fails_after_launch(&stub, &mut observed_pid);

    // THEN: The error propagated and the launched process is gone
    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    let pid = observed_pid.expect("First launch should have recorded a PID");
    assert!(wait_until_gone(pid).await, "PID {pid} should be gone");
}

/// **VALUE**: Verifies a panic inside the scope still tears the process down.
///
/// **WHY THIS MATTERS**: Failed assertions panic. A failing assertion is the most common way a
/// test body exits early.
///
/// **BUG THIS CATCHES**: Would catch cleanup being tied to an explicit call at the end of the
/// test rather than to unwinding.
#[tokio::test]
#[serial]
async fn given_panic_inside_scope_when_unwound_then_process_is_gone() {
    // GIVEN: A stub server
    let stub = StubServer::new();
    let mut observed_pid = None;

    // WHEN: A scope launches and then panics
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let handle = launch_stub(&stub).unwrap();
        observed_pid = handle.pid();
        panic!("injected failure");
    }));

    // THEN: The panic was caught and the process is gone
    assert!(outcome.is_err(), "Scope should have panicked");
    let pid = observed_pid.expect("Launch should have recorded a PID");
    assert!(wait_until_gone(pid).await, "PID {pid} should be gone");
}

/// **VALUE**: Verifies independent handles do not interfere with each other.
///
/// **WHY THIS MATTERS**: Clustering tests run several servers at once. Stopping one must
/// never touch the others.
///
/// **BUG THIS CATCHES**: Would catch any shared or static process state between handles.
#[tokio::test]
#[serial]
async fn given_two_handles_when_one_dropped_then_other_keeps_running() {
    // GIVEN: Two independent stubs
    let first_stub = StubServer::new();
    let second_stub = StubServer::new();
    let first = launch_stub(&first_stub).unwrap();
    let mut second = launch_stub(&second_stub).unwrap();
    let first_pid = first.pid().unwrap();
    let second_pid = second.pid().unwrap();

    // WHEN: Dropping the first
    drop(first);

    // THEN: Only the first is gone
    assert!(wait_until_gone(first_pid).await);
    assert!(is_pid_alive(second_pid), "Second server should be unaffected");
    assert!(second.is_alive());

    second.shutdown();
    assert!(wait_until_gone(second_pid).await);
}
