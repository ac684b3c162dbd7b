mod collaborators;
mod configs;
mod error;
mod registry;
mod service;

pub use collaborators::{
    BootstrapError, ClusterBootstrap, ClusterHandle, DataFormat, DatasetImporter, ImportError,
};
pub use configs::{
    ActivationConfig, LossConfig, ModeConfig, ParamsConfig, ScoreRequest, TrainRequest,
    WeightDistributionConfig,
};
pub use error::OrchestrationError;
pub use registry::Registry;
pub use service::TrainingService;
