use std::{error::Error, fmt, time::Duration};

use ml_core::{ConfigError, FrameError};

/// Rejections raised at submission time, before any job exists.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// Invalid hyperparameter combination.
    Config(ConfigError),

    /// The requested execution mode is not supported in this build.
    /// Never substituted by another mode.
    CapabilityUnavailable { mode: &'static str },

    /// Column roles could not be resolved against a dataset.
    Frame(FrameError),

    /// Train and validation frames disagree on column count.
    SchemaMismatch { train_cols: usize, valid_cols: usize },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Config(e) => write!(f, "{e}"),
            SetupError::CapabilityUnavailable { mode } => {
                write!(f, "execution mode {mode} is not available in this build")
            }
            SetupError::Frame(e) => write!(f, "{e}"),
            SetupError::SchemaMismatch {
                train_cols,
                valid_cols,
            } => write!(
                f,
                "train frame has {train_cols} columns, validation frame has {valid_cols}"
            ),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetupError::Config(e) => Some(e),
            SetupError::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<FrameError> for SetupError {
    fn from(value: FrameError) -> Self {
        Self::Frame(value)
    }
}

/// Runtime failures while a job is training. Recorded in the job, never
/// thrown across the asynchronous boundary to the submitter.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    /// Loss or weights became non-finite; the job moves to `Failed`.
    Diverged { epoch: usize },

    /// A worker failed to report its partial result for an epoch; the whole
    /// epoch fails, no partial commit.
    ReductionFailure { worker: usize },

    /// Cooperative cancellation was observed at an epoch boundary.
    Cancelled,

    /// Validation scoring failed mid-run.
    Scoring(ScoreError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainError::Diverged { epoch } => {
                write!(f, "training diverged during epoch {epoch}")
            }
            TrainError::ReductionFailure { worker } => {
                write!(f, "worker {worker} failed to report its epoch result")
            }
            TrainError::Cancelled => write!(f, "job was cancelled"),
            TrainError::Scoring(e) => write!(f, "validation scoring failed: {e}"),
        }
    }
}

impl Error for TrainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainError::Scoring(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScoreError> for TrainError {
    fn from(value: ScoreError) -> Self {
        Self::Scoring(value)
    }
}

/// Scoring failures, surfaced synchronously to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The dataset's feature width doesn't match the model's input width.
    ShapeMismatch { expected: usize, got: usize },

    /// The layout references columns the frame doesn't have.
    Frame(FrameError),
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::ShapeMismatch { expected, got } => write!(
                f,
                "dataset provides {got} features, model expects {expected}"
            ),
            ScoreError::Frame(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ScoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScoreError::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for ScoreError {
    fn from(value: FrameError) -> Self {
        Self::Frame(value)
    }
}

/// The monitor's polling budget ran out. The job itself is unaffected and
/// keeps running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    Timeout { waited: Duration },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Timeout { waited } => {
                write!(f, "job did not finish within {waited:?}")
            }
        }
    }
}

impl Error for MonitorError {}
