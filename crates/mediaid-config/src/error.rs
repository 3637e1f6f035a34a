use std::io;

use thiserror::Error;

/// Failures reading, writing or validating the intake settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not access settings: {0}")]
    Io(#[from] io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Serde(String),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("configuration backup `{0}` not found")]
    MissingBackup(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err.to_string())
    }
}
