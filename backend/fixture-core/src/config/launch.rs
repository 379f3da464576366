use crate::error::launch::LaunchError;
use crate::{STAN_SERVER_BIN_ENV, STAN_SERVER_DIR, STAN_SERVER_PATH};

use common::ErrorLocation;

use std::env::var_os;
use std::ffi::OsString;
use std::io::Result as IoResult;
use std::panic::Location;
use std::path::{Path, PathBuf, absolute};

use log::debug;
use serde::{Deserialize, Serialize};

/// Where the server binary lives and where it runs. Unset fields fall back
/// to the environment, then to the build-output defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchConfig {
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default)]
    pub working_directory: Option<PathBuf>,
}

/// Fully resolved launch location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub executable: PathBuf,
    pub working_directory: PathBuf,
}

impl LaunchConfig {
    /// Resolve using the `STAN_SERVER_BIN` environment variable as the first fallback.
    #[track_caller]
    pub fn resolve(&self) -> Result<LaunchOptions, LaunchError> {
        self.resolve_with(var_os(STAN_SERVER_BIN_ENV))
    }

    /// Resolve with an explicit environment value.
    ///
    /// Precedence: configured executable, then `env_executable`, then
    /// `target/nats-streaming-server`. Relative paths with a directory
    /// component are made absolute against the current directory so they
    /// survive the change of working directory at spawn time. Bare names are
    /// left alone for `PATH` lookup.
    #[track_caller]
    pub fn resolve_with(
        &self,
        env_executable: Option<OsString>,
    ) -> Result<LaunchOptions, LaunchError> {
        let executable = match (&self.executable, env_executable) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(STAN_SERVER_PATH),
        };

        let executable = absolutize(&executable).map_err(|e| LaunchError::Executable {
            message: format!(
                "Failed to resolve executable path {}: {e}",
                executable.display()
            ),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        let working_directory = self
            .working_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(STAN_SERVER_DIR));

        debug!(
            "Resolved launch: executable={}, working_directory={}",
            executable.display(),
            working_directory.display()
        );

        Ok(LaunchOptions {
            executable,
            working_directory,
        })
    }
}

pub(crate) fn absolutize(path: &Path) -> IoResult<PathBuf> {
    let is_bare_name = path
        .parent()
        .is_none_or(|parent| parent.as_os_str().is_empty());

    if path.is_absolute() || is_bare_name {
        return Ok(path.to_path_buf());
    }

    absolute(path)
}
