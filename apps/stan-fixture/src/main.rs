use stan_fixture::error::FixtureAppError;
use stan_fixture::logger::initialize as LoggerInitialize;
use stan_fixture::runner::{config_dir, ctrl_c, load_config, log_dir, run_until};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;

use log::{debug, info};

#[tokio::main]
async fn main() -> Result<(), FixtureAppError> {
    let dotenv = dotenvy::dotenv();

    let log_dir = log_dir();
    create_dir_all(&log_dir).map_err(|e| FixtureAppError::Fixture {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;
    LoggerInitialize(&log_dir)?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {e}"),
    }

    let config = load_config(&config_dir()?)?;
    let pid = run_until(config, ctrl_c()).await?;

    info!("Streaming server fixture finished (last PID: {pid})");
    Ok(())
}
