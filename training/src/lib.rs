mod error;
mod job;
mod merge;
mod monitor;
mod schedule;
mod scorer;
mod shard;
mod sgd;
mod strategy;
mod trainer;

pub use error::{MonitorError, ScoreError, SetupError, TrainError};
pub use job::{launch, JobHandle, JobState, ValidationSnapshot};
pub use monitor::{JobReport, Monitor};
pub use scorer::{score, ScoreResult};
pub use shard::shard_range;
pub use strategy::{Capabilities, ExecutionMode};
pub use trainer::{TrainData, Trainer};
