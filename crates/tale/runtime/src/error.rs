//! Errors surfaced by the runtime driver.

use std::io;
use std::path::PathBuf;

use tale_core::{ActionError, ConfigError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to read config {}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("time scale must be a finite, non-negative number (got {0})")]
    InvalidTimeScale(f32),

    #[error("director halted on a failed action")]
    Halted(#[source] ActionError),
}
