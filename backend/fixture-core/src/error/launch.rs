use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LaunchError {
    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Working Directory Error: {message} {location}")]
    WorkingDirectory {
        message: String,
        location: ErrorLocation,
        path: PathBuf,
    },

    #[error("Executable Error: {message} {location}")]
    Executable {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Already Running Error: {message} {location}")]
    AlreadyRunning {
        message: String,
        location: ErrorLocation,
    },
}

impl LaunchError {
    pub fn location(&self) -> ErrorLocation {
        match self {
            LaunchError::Spawn { location, .. }
            | LaunchError::WorkingDirectory { location, .. }
            | LaunchError::Executable { location, .. }
            | LaunchError::AlreadyRunning { location, .. } => *location,
        }
    }
}
