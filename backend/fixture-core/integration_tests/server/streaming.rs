use crate::helpers::{CurrentDirGuard, StubServer, wait_until_gone};

use fixture_core::config::{LaunchOptions, ServerConfig};
use fixture_core::error::launch::LaunchError;
use fixture_core::process::{IoMode, ProcessState};
use fixture_core::server::StreamingServer;

use std::fs::canonicalize;
use std::path::PathBuf;

use serial_test::serial;

// ============================================================================
// Public API tests for StreamingServer (config -> argv -> running process)
// ============================================================================

/// **VALUE**: Verifies the canonical quiet config reaches the OS as the expected argv.
///
/// **WHY THIS MATTERS**: This is the end-to-end path every test uses: config in, server
/// process out. Checking the argv the child saw covers builder, command and spawn together.
///
/// **BUG THIS CATCHES**: Would catch mismatches between the logged ArgumentList and the real
/// argv, or quiet configs inheriting stdout.
#[tokio::test]
#[serial]
async fn given_cluster_and_port_config_when_started_then_server_sees_expected_argv() {
    // GIVEN: {cluster_id: "test-cluster", port: 4333, verbose: false}
    let stub = StubServer::new();
    let config = ServerConfig::default()
        .with_cluster_id("test-cluster")
        .with_port(4333);

    // WHEN: Starting
    let server = StreamingServer::start(config, &stub.launch_options()).unwrap();

    // THEN: Running, Discard, argv as expected
    assert_eq!(server.state(), ProcessState::Running);
    assert_eq!(server.io_mode(), IoMode::Discard);
    assert_eq!(server.working_directory(), stub.working_directory);
    assert!(
        server
            .handle()
            .command_line()
            .ends_with("-cluster_id test-cluster -p 4333")
    );
    assert_eq!(
        stub.recorded_argv().await,
        vec!["-cluster_id", "test-cluster", "-p", "4333"]
    );

    // AND: Dropping the server kills it
    let pid = server.pid().unwrap();
    drop(server);
    assert!(wait_until_gone(pid).await);
}

/// **VALUE**: Verifies a verbose config with port 80 starts with `-DV` only and inherits IO.
///
/// **WHY THIS MATTERS**: Debug runs need the server's own output on the console. The
/// privileged port is dropped rather than failing the start.
///
/// **BUG THIS CATCHES**: Would catch verbosity not selecting Inherit, or port 80 reaching argv.
#[tokio::test]
#[serial]
async fn given_verbose_config_with_privileged_port_when_started_then_inherits_and_drops_port() {
    // GIVEN: {port: 80, verbose: true}
    let stub = StubServer::new();
    let config = ServerConfig::default().with_port(80).with_verbose(true);

    // WHEN: Starting
    let mut server = StreamingServer::start(config, &stub.launch_options()).unwrap();

    // THEN: Inherit, argv is just -DV
    assert_eq!(server.io_mode(), IoMode::Inherit);
    assert_eq!(stub.recorded_argv().await, vec!["-DV"]);
    assert_eq!(server.config().effective_port(), None);

    server.shutdown();
    assert_eq!(server.state(), ProcessState::Stopped);
}

/// **VALUE**: Verifies a missing server binary fails the start with a Spawn error.
///
/// **WHY THIS MATTERS**: Running the suite before building the server must fail fast and say
/// which binary was missing.
///
/// **BUG THIS CATCHES**: Would catch start() returning a server whose handle never launched.
#[tokio::test]
#[serial]
async fn given_missing_binary_when_started_then_returns_spawn_error() {
    // GIVEN: Launch options pointing at a missing binary
    let stub = StubServer::new();
    let launch = LaunchOptions {
        executable: stub.working_directory.join("nats-streaming-server"),
        working_directory: stub.working_directory.clone(),
    };

    // WHEN: Starting
    let result = StreamingServer::start(ServerConfig::default(), &launch);

    // THEN: Spawn error mentioning the binary
    match result {
        Err(LaunchError::Spawn { message, .. }) => {
            assert!(message.contains("nats-streaming-server"), "Message: {message}");
        }
        Err(other) => panic!("Expected Spawn error, got {other:?}"),
        Ok(_) => panic!("Start should fail without a binary"),
    }
}

/// **VALUE**: Verifies a relative executable is found relative to the caller, not the
/// server's working directory.
///
/// **WHY THIS MATTERS**: The default layout is `target/nats-streaming-server` run from
/// `target`. Resolved against the child's directory that becomes
/// `target/target/nats-streaming-server` and the launch fails.
///
/// **BUG THIS CATCHES**: Would catch `LaunchOptions` built by hand skipping the absolute path
/// step that `LaunchConfig::resolve` performs.
#[tokio::test]
#[serial]
async fn given_relative_launch_options_when_started_then_executable_resolves_from_caller_dir() {
    // GIVEN: Caller sitting in the stub's directory with relative paths
    let stub = StubServer::new();
    let _cwd = CurrentDirGuard::enter(stub.root());
    let launch = LaunchOptions {
        executable: PathBuf::from("./stub-stan-server"),
        working_directory: PathBuf::from("run"),
    };

    // WHEN: Starting
    let mut server = StreamingServer::start(ServerConfig::default(), &launch).unwrap();

    // THEN: The stub ran, from the run directory
    assert_eq!(server.state(), ProcessState::Running);
    assert_eq!(
        stub.recorded_cwd().await,
        canonicalize(&stub.working_directory).unwrap()
    );

    server.shutdown();
    assert_eq!(server.state(), ProcessState::Stopped);
}
