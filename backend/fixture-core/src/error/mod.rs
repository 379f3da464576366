pub mod config;
pub mod launch;

use common::ErrorLocation;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Launch(#[from] launch::LaunchError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    /// Call site recorded by the wrapped error.
    pub fn location(&self) -> ErrorLocation {
        match self {
            CoreError::Launch(e) => e.location(),
            CoreError::Config(e) => e.location(),
        }
    }
}
