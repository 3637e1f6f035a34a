use thiserror::Error;

use mediaid_config::ConfigError;
use mediaid_core::{ApiError, CoreError, SessionError, SubmissionError};

/// Top-level error surfaced by the intake CLI.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error("Not signed in. Run `mediaid_intake login` or `mediaid_intake setup` first.")]
    NotSignedIn,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}
