//! Test helpers for process integration tests.
//!
//! The real streaming server is not available in CI, so these tests launch a
//! stub shell script in its place. The stub records the argv it was given and
//! the directory it was started in, then `exec`s into `sleep` so the PID the
//! handle owns is the long-running process.

use fixture_core::config::LaunchOptions;
use fixture_core::process::liveness::is_pid_alive;

use std::env::{current_dir, set_current_dir};
use std::fs::{File, Permissions, canonicalize, create_dir, read_to_string, set_permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

const STUB_NAME: &str = "stub-stan-server";
const ARGV_FILE: &str = "argv.txt";
const CWD_FILE: &str = "cwd.txt";
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Records `$@` one per line and `pwd`, each via rename so readers never see
/// a half-written file. `cwd.txt` is written last.
const RECORDING_PRELUDE: &str = r#"printf '%s\n' "$@" > argv.tmp && mv argv.tmp argv.txt
pwd > cwd.tmp && mv cwd.tmp cwd.txt
"#;

/// A stand-in server executable living in its own temp directory.
pub struct StubServer {
    dir: TempDir,
    pub executable: PathBuf,
    pub working_directory: PathBuf,
}

impl StubServer {
    /// Stub that exits on SIGTERM like a well-behaved server.
    pub fn new() -> Self {
        Self::with_body("exec sleep 30\n")
    }

    /// Stub that ignores SIGTERM, so only a kill stops it.
    pub fn ignoring_term() -> Self {
        Self::with_body("trap '' TERM\nexec sleep 30\n")
    }

    fn with_body(body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let executable = dir.path().join(STUB_NAME);
        let working_directory = dir.path().join("run");
        create_dir(&working_directory).expect("Failed to create working dir");

        write_executable(
            &executable,
            &format!("#!/bin/sh\n{RECORDING_PRELUDE}{body}"),
        );

        Self {
            dir,
            executable,
            working_directory,
        }
    }

    /// Directory holding the stub executable and its `run` working directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            executable: self.executable.clone(),
            working_directory: self.working_directory.clone(),
        }
    }

    /// Wait for the stub to record its startup, then return the argv it saw
    /// (excluding the program name).
    pub async fn recorded_argv(&self) -> Vec<String> {
        self.wait_for_recording().await;
        read_to_string(self.working_directory.join(ARGV_FILE))
            .expect("Failed to read recorded argv")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Wait for the stub to record its startup, then return its canonical cwd.
    pub async fn recorded_cwd(&self) -> PathBuf {
        self.wait_for_recording().await;
        let raw = read_to_string(self.working_directory.join(CWD_FILE))
            .expect("Failed to read recorded cwd");
        canonicalize(raw.trim()).expect("Recorded cwd should exist")
    }

    async fn wait_for_recording(&self) {
        let marker = self.working_directory.join(CWD_FILE);
        let found = poll_until(|| marker.exists()).await;
        assert!(found, "Stub server never recorded its startup");
    }
}

/// Switches the process working directory until dropped.
///
/// Only for `#[serial]` tests: the working directory is process-wide.
pub struct CurrentDirGuard {
    previous: PathBuf,
}

impl CurrentDirGuard {
    pub fn enter(dir: &Path) -> Self {
        let previous = current_dir().expect("Failed to read current dir");
        set_current_dir(dir).expect("Failed to change current dir");
        Self { previous }
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        let _ = set_current_dir(&self.previous);
    }
}

/// Write `contents` to `path` and mark it executable.
pub fn write_executable(path: &Path, contents: &str) {
    {
        let mut file = File::create(path).expect("Failed to create stub");
        file.write_all(contents.as_bytes())
            .expect("Failed to write stub");
        file.sync_all().expect("Failed to sync stub");
    }
    set_permissions(path, Permissions::from_mode(0o755)).expect("Failed to chmod stub");
}

/// Poll `condition` until it holds or the timeout passes.
pub async fn poll_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + POLL_TIMEOUT;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until `pid` no longer names a live process.
pub async fn wait_until_gone(pid: u32) -> bool {
    poll_until(|| !is_pid_alive(pid)).await
}
