//! The streaming server as a ready-made test fixture.
//!
//! [`StreamingServer::start`] turns a [`ServerConfig`] into a running
//! process in one call:
//!
//! ```no_run
//! # async fn demo() -> Result<(), fixture_core::error::launch::LaunchError> {
//! use fixture_core::config::ServerConfig;
//! use fixture_core::server::StreamingServer;
//!
//! let config = ServerConfig::default()
//!     .with_cluster_id("test-cluster")
//!     .with_port(4333);
//! let server = StreamingServer::start_default(config)?;
//! // ... connect a client, run the test ...
//! drop(server); // or let it fall out of scope
//! # Ok(())
//! # }
//! ```

use crate::args::ArgumentList;
use crate::config::{LaunchConfig, LaunchOptions, ServerConfig};
use crate::error::launch::LaunchError;
use crate::process::{IoMode, ProcessHandle, ProcessState};

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

/// A launched streaming server. Dropping it stops the process.
#[derive(Debug)]
pub struct StreamingServer {
    handle: ProcessHandle,
    config: ServerConfig,
    arguments: ArgumentList,
    io_mode: IoMode,
    working_directory: PathBuf,
}

impl StreamingServer {
    /// Build the argument list for `config` and launch it from `launch`.
    ///
    /// Verbose configs inherit the parent's stdout/stderr; others discard them.
    #[track_caller]
    pub fn start(config: ServerConfig, launch: &LaunchOptions) -> Result<Self, LaunchError> {
        let arguments = config.arguments(&launch.executable);
        let io_mode = IoMode::for_verbosity(config.verbose);

        debug!(
            "Starting streaming server: cluster_id={:?}, port={:?}, verbose={}",
            config.cluster_id,
            config.effective_port(),
            config.verbose
        );

        let mut handle = ProcessHandle::new();
        handle.launch(&arguments, &launch.working_directory, io_mode)?;

        Ok(Self {
            handle,
            config,
            arguments,
            io_mode,
            working_directory: launch.working_directory.clone(),
        })
    }

    /// [`start`](Self::start) with the default launch location
    /// (`STAN_SERVER_BIN`, else `target/nats-streaming-server`).
    #[track_caller]
    pub fn start_default(config: ServerConfig) -> Result<Self, LaunchError> {
        let launch = LaunchConfig::default().resolve()?;
        Self::start(config, &launch)
    }

    pub fn shutdown(&mut self) {
        self.handle.shutdown();
    }

    pub async fn stop_gracefully(&mut self, grace: Duration) {
        self.handle.stop_gracefully(grace).await;
    }

    pub fn state(&self) -> ProcessState {
        self.handle.state()
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.pid()
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn arguments(&self) -> &ArgumentList {
        &self.arguments
    }

    pub fn io_mode(&self) -> IoMode {
        self.io_mode
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}
