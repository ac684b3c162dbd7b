use std::{error::Error, fmt};

use training::{ScoreError, SetupError};

/// All errors the request surfaces can return.
///
/// Submission-time problems (configuration, capability, unknown keys) are
/// surfaced here synchronously; runtime training failures never appear here,
/// they live inside the job.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    /// Invalid configuration, missing capability or unusable column roles.
    Setup(SetupError),

    /// No dataset registered under this key.
    UnknownFrame { key: String },

    /// No model registered under this key, or its job hasn't completed.
    UnknownModel { key: String },

    /// Scoring rejected the model/dataset combination.
    Score(ScoreError),
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationError::Setup(e) => write!(f, "{e}"),
            OrchestrationError::UnknownFrame { key } => {
                write!(f, "no dataset registered under key `{key}`")
            }
            OrchestrationError::UnknownModel { key } => {
                write!(f, "no trained model available under key `{key}`")
            }
            OrchestrationError::Score(e) => write!(f, "{e}"),
        }
    }
}

impl Error for OrchestrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OrchestrationError::Setup(e) => Some(e),
            OrchestrationError::Score(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SetupError> for OrchestrationError {
    fn from(value: SetupError) -> Self {
        Self::Setup(value)
    }
}

impl From<ScoreError> for OrchestrationError {
    fn from(value: ScoreError) -> Self {
        Self::Score(value)
    }
}
