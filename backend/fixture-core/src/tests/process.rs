// Unit tests for process module private functions
// Integration tests that actually spawn processes are in integration_tests/process

use crate::args::ArgumentList;
use crate::error::launch::LaunchError;
use crate::process::{IoMode, ProcessHandle, ProcessState, build_command};

use std::ffi::OsStr;
use std::path::Path;

/// **VALUE**: Verifies `build_command()` maps the ArgumentList onto program, args and cwd.
///
/// **WHY THIS MATTERS**: The ArgumentList is the literal argv. If the executable token is
/// passed as an argument, or arguments are re-joined, the server sees a different command line
/// from the one that was logged.
///
/// **BUG THIS CATCHES**: Would catch off-by-one slicing of the token list or a missing
/// `current_dir`.
#[test]
fn given_argument_list_when_build_command_called_then_program_args_and_cwd_match() {
    // GIVEN: An argument list with a value containing a space
    let mut arguments = ArgumentList::new("/opt/stan/nats-streaming-server");
    arguments.push("-DV").push_flag("-cluster_id", "two words");

    // WHEN: Building the command
    let cmd = build_command(
        Path::new(arguments.program()),
        &arguments,
        Path::new("/tmp"),
        IoMode::Discard,
    );

    // THEN: Program, args and working directory line up
    let std_cmd = cmd.as_std();
    assert_eq!(
        std_cmd.get_program(),
        OsStr::new("/opt/stan/nats-streaming-server")
    );
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(
        args,
        vec![
            OsStr::new("-DV"),
            OsStr::new("-cluster_id"),
            OsStr::new("two words")
        ]
    );
    assert_eq!(std_cmd.get_current_dir(), Some(Path::new("/tmp")));
}

/// **VALUE**: Verifies verbosity picks the I/O mode.
///
/// **WHY THIS MATTERS**: Quiet test runs must not be flooded with server output, while
/// verbose runs exist precisely to see it.
///
/// **BUG THIS CATCHES**: Would catch the mapping being inverted or Discard no longer being
/// the default.
#[test]
fn given_verbosity_when_choosing_io_mode_then_inherit_only_when_verbose() {
    assert_eq!(IoMode::for_verbosity(true), IoMode::Inherit);
    assert_eq!(IoMode::for_verbosity(false), IoMode::Discard);
    assert_eq!(IoMode::default(), IoMode::Discard);
}

/// **VALUE**: Verifies shutdown on a never-launched handle is a silent no-op.
///
/// **WHY THIS MATTERS**: Teardown code calls shutdown unconditionally, including after a
/// setup that failed before launch.
///
/// **BUG THIS CATCHES**: Would catch shutdown panicking on a missing child or wrongly moving
/// a never-started handle to `Stopped`.
#[test]
fn given_fresh_handle_when_shutdown_called_twice_then_remains_not_started() {
    // GIVEN: A handle that never launched
    let mut handle = ProcessHandle::new();
    assert_eq!(handle.state(), ProcessState::NotStarted);

    // WHEN: Shutting down twice
    handle.shutdown();
    handle.shutdown();

    // THEN: Still NotStarted, nothing owned
    assert_eq!(handle.state(), ProcessState::NotStarted);
    assert_eq!(handle.pid(), None);
    assert!(!handle.is_alive());
}

/// **VALUE**: Verifies launch refuses a working directory that does not exist.
///
/// **WHY THIS MATTERS**: The server is run from the build output directory. If it has not been
/// created yet, the error should say so instead of a generic "No such file or directory".
///
/// **BUG THIS CATCHES**: Would catch the directory check being removed, or the handle changing
/// state on a failed launch.
#[test]
fn given_missing_working_directory_when_launch_called_then_returns_working_directory_error() {
    // GIVEN: A fresh handle and a directory that does not exist
    let mut handle = ProcessHandle::new();
    let arguments = ArgumentList::new("/bin/true");
    let missing = Path::new("/definitely/not/a/real/dir");

    // WHEN: Launching
    let result = handle.launch(&arguments, missing, IoMode::Discard);

    // THEN: WorkingDirectory error naming the path, handle untouched
    match result {
        Err(LaunchError::WorkingDirectory { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected WorkingDirectory error, got {other:?}"),
    }
    assert_eq!(handle.state(), ProcessState::NotStarted);
    assert_eq!(handle.command_line(), "<not started>");
}

/// **VALUE**: Verifies state names used in log lines.
///
/// **WHY THIS MATTERS**: Fixture state appears in debugging output; it should read naturally.
///
/// **BUG THIS CATCHES**: Would catch Display falling back to Debug-style names.
#[test]
fn given_process_states_when_displayed_then_human_readable() {
    assert_eq!(ProcessState::NotStarted.to_string(), "not started");
    assert_eq!(ProcessState::Running.to_string(), "running");
    assert_eq!(ProcessState::Stopped.to_string(), "stopped");
}
