use thiserror::Error;

use crate::domain::{CoderError, ScriptError};
use crate::replay::{IntakeError, ReplayError};

/// Test stream error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid script: {0}")]
    Script(#[from] ScriptError),

    #[error("Replay failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("Encoding error: {0}")]
    Coder(#[from] CoderError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

impl Error {
    /// Index of the offending event, when the error concerns one
    pub fn event_index(&self) -> Option<usize> {
        match self {
            Self::Script(err) => err.event_index(),
            Self::Replay(ReplayError::IntakeRejected { index, .. }) => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
