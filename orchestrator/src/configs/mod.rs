mod adapter;
mod request;

pub use request::{
    ActivationConfig, LossConfig, ModeConfig, ParamsConfig, ScoreRequest, TrainRequest,
    WeightDistributionConfig,
};
