//! Hold a streaming server for the lifetime of the binary.

use crate::error::FixtureAppError;

use common::ErrorLocation;

use fixture_core::config::FixtureConfig;
use fixture_core::error::CoreError;
use fixture_core::server::StreamingServer;

use std::env::{current_dir, temp_dir, var_os};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

/// Directory holding `fixture.json`. Defaults to the current directory.
pub const CONFIG_DIR_ENV: &str = "STAN_FIXTURE_CONFIG_DIR";

/// Directory for `stan-fixture.log`. Defaults to the user cache directory.
pub const LOG_DIR_ENV: &str = "STAN_FIXTURE_LOG_DIR";

const APP_DIR_NAME: &str = "stan-fixture";

/// How long the server gets to exit on SIGTERM before it is killed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[track_caller]
pub fn config_dir() -> Result<PathBuf, FixtureAppError> {
    if let Some(dir) = var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    current_dir().map_err(|e| FixtureAppError::Fixture {
        message: format!("Failed to read current directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

pub fn log_dir() -> PathBuf {
    var_os(LOG_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR_NAME)))
        .unwrap_or_else(|| temp_dir().join(APP_DIR_NAME))
}

pub fn load_config(config_dir: &Path) -> Result<FixtureConfig, FixtureAppError> {
    let config = FixtureConfig::load(config_dir).map_err(CoreError::from)?;
    info!(
        "Loaded fixture config from {} (cluster_id: {:?}, port: {:?}, verbose: {})",
        config_dir.display(),
        config.server.cluster_id,
        config.server.effective_port(),
        config.server.verbose
    );
    Ok(config)
}

/// Start the server, wait for `shutdown_signal`, then stop it.
///
/// Returns the PID the server ran under.
pub async fn run_until<F>(config: FixtureConfig, shutdown_signal: F) -> Result<u32, FixtureAppError>
where
    F: Future<Output = ()>,
{
    let launch = config.launch.resolve().map_err(CoreError::from)?;
    let mut server = StreamingServer::start(config.server, &launch).map_err(CoreError::from)?;

    let Some(pid) = server.pid() else {
        return Err(FixtureAppError::Fixture {
            message: "Server started without a PID".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    info!("Streaming server running (PID: {pid}), waiting for shutdown signal");
    shutdown_signal.await;

    info!("Shutdown requested, stopping streaming server (PID: {pid})");
    server.stop_gracefully(SHUTDOWN_GRACE).await;
    Ok(pid)
}

/// Resolves on Ctrl-C. A failed signal listener resolves at once so the
/// server is never left running unattended.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
    }
}
