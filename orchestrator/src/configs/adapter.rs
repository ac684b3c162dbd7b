//! Conversions from wire-level configs into the typed core.

use std::num::NonZeroUsize;

use ml_core::{Activation, ConfigError, HyperParameters, InitialWeightDistribution, LossKind};
use training::ExecutionMode;

use super::request::{
    ActivationConfig, LossConfig, ModeConfig, ParamsConfig, WeightDistributionConfig,
};

impl From<ActivationConfig> for Activation {
    fn from(value: ActivationConfig) -> Self {
        match value {
            ActivationConfig::Tanh => Activation::Tanh,
            ActivationConfig::TanhWithDropout => Activation::TanhWithDropout,
            ActivationConfig::Rectifier => Activation::Rectifier,
            ActivationConfig::RectifierWithDropout => Activation::RectifierWithDropout,
        }
    }
}

impl From<LossConfig> for LossKind {
    fn from(value: LossConfig) -> Self {
        match value {
            LossConfig::CrossEntropy => LossKind::CrossEntropy,
            LossConfig::MeanSquaredError => LossKind::MeanSquaredError,
        }
    }
}

impl From<WeightDistributionConfig> for InitialWeightDistribution {
    fn from(value: WeightDistributionConfig) -> Self {
        match value {
            WeightDistributionConfig::UniformAdaptive => InitialWeightDistribution::UniformAdaptive,
            WeightDistributionConfig::Uniform { scale } => {
                InitialWeightDistribution::Uniform { scale }
            }
            WeightDistributionConfig::Normal { scale } => {
                InitialWeightDistribution::Normal { scale }
            }
        }
    }
}

impl ModeConfig {
    /// Resolves the wire mode into the closed execution-mode variant.
    ///
    /// # Errors
    /// `ConfigError` for zero worker or node counts.
    pub fn to_mode(self) -> Result<ExecutionMode, ConfigError> {
        match self {
            ModeConfig::SingleThread => Ok(ExecutionMode::SingleThread),
            ModeConfig::SingleNode { workers: None } => {
                Ok(ExecutionMode::SingleNode { workers: None })
            }
            ModeConfig::SingleNode {
                workers: Some(workers),
            } => NonZeroUsize::new(workers)
                .map(|workers| ExecutionMode::SingleNode {
                    workers: Some(workers),
                })
                .ok_or_else(|| ConfigError::new("mode", "worker count must be positive")),
            ModeConfig::MultiNode { nodes } => NonZeroUsize::new(nodes)
                .map(|nodes| ExecutionMode::MultiNode { nodes })
                .ok_or_else(|| ConfigError::new("mode", "node count must be positive")),
        }
    }
}

impl ParamsConfig {
    /// Maps onto the validated hyperparameter struct; `Trainer::new` performs
    /// the actual validation.
    pub fn to_hyperparams(&self) -> HyperParameters {
        HyperParameters {
            activation: self.activation.into(),
            hidden: self.hidden.clone(),
            rate: self.rate,
            rate_annealing: self.rate_annealing,
            momentum_start: self.momentum_start,
            momentum_ramp: self.momentum_ramp,
            momentum_stable: self.momentum_stable,
            l1: self.l1,
            l2: self.l2,
            max_w2: self.max_w2.unwrap_or(f32::INFINITY),
            input_dropout_ratio: self.input_dropout_ratio,
            initial_weight_distribution: self.initial_weight_distribution.into(),
            seed: self.seed,
            loss: self.loss.into(),
            warmup_samples: self.warmup_samples,
            classification: self.classification,
            epochs: self.epochs,
        }
    }
}
