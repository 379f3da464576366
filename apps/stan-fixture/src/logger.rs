//! Logging for the fixture binary: colored stdout plus `stan-fixture.log`.

use crate::error::FixtureAppError;

use common::ErrorLocation;

use std::env::var;
use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "stan-fixture.log";

/// Level override: `trace`, `debug`, `info`, `warn`, `error` or `off`.
pub const LOG_LEVEL_ENV: &str = "STAN_FIXTURE_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Unknown or missing values give the build default.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Install the global logger. Repeat calls warn and return Ok.
pub fn initialize(log_dir: &Path) -> Result<(), FixtureAppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized, keeping the first configuration");
        return Ok(());
    }

    let level = level_from(var(LOG_LEVEL_ENV).ok().as_deref());
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("Logging at {level} to {}", log_dir.join(LOG_FILE_NAME).display());
        }
    });

    result
}

#[track_caller]
pub(crate) fn initialize_internal(
    log_dir: &Path,
    level: LevelFilter,
) -> Result<(), FixtureAppError> {
    let location = ErrorLocation::from(Location::caller());
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let log_file = fern::log_file(&log_file_path).map_err(|e| FixtureAppError::Fixture {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location,
    })?;

    let colors = ColoredLevelConfig::new()
        .trace(Magenta)
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    let console = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} - {}] {message} [{}]",
                format_rfc3339(SystemTime::now()),
                colors.color(record.level()),
                record.target(),
            ))
        })
        .chain(stdout());

    // No colors in the file; source positions instead of targets
    let file = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} - {}] {message} [{}:{}]",
                format_rfc3339(SystemTime::now()),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
            ))
        })
        .chain(log_file);

    Dispatch::new()
        .level(level)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| FixtureAppError::Fixture {
            message: format!("Failed to install logger: {e}"),
            location,
        })
}
