use common::ErrorLocation;

use fixture_core::error::CoreError;

use thiserror::Error;

/// Errors surfaced by the fixture binary.
#[derive(Debug, Error)]
pub enum FixtureAppError {
    /// Error from this app (logging, directories, signals)
    #[error("Fixture Error: {message} {location}")]
    Fixture {
        message: String,
        location: ErrorLocation,
    },

    /// Error from fixture-core (config, launch)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for FixtureAppError {
    /// Keeps the location recorded by fixture-core rather than the conversion site.
    fn from(err: CoreError) -> Self {
        FixtureAppError::Core {
            message: err.to_string(),
            location: err.location(),
        }
    }
}
