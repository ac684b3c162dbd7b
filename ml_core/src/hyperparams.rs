use crate::{Activation, ConfigError, InitialWeightDistribution, LossKind};

/// Immutable training configuration, validated once at submission time.
///
/// Sample counts (`momentum_ramp`, `warmup_samples`) are measured in training
/// rows seen; `epochs` is fractional, a remainder processes a prefix of the
/// final epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParameters {
    pub activation: Activation,
    pub hidden: Vec<usize>,
    pub rate: f32,
    pub rate_annealing: f32,
    pub momentum_start: f32,
    pub momentum_ramp: u64,
    pub momentum_stable: f32,
    pub l1: f32,
    pub l2: f32,
    /// Cap on a unit's incoming weight squared norm; `f32::INFINITY` disables.
    pub max_w2: f32,
    pub input_dropout_ratio: f32,
    pub initial_weight_distribution: InitialWeightDistribution,
    pub seed: u64,
    pub loss: LossKind,
    pub warmup_samples: u64,
    pub classification: bool,
    pub epochs: f64,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            activation: Activation::Rectifier,
            hidden: vec![200],
            rate: 0.005,
            rate_annealing: 1e-6,
            momentum_start: 0.0,
            momentum_ramp: 0,
            momentum_stable: 0.0,
            l1: 0.0,
            l2: 0.0,
            max_w2: f32::INFINITY,
            input_dropout_ratio: 0.0,
            initial_weight_distribution: InitialWeightDistribution::UniformAdaptive,
            seed: 0,
            loss: LossKind::CrossEntropy,
            warmup_samples: 0,
            classification: true,
            epochs: 10.0,
        }
    }
}

impl HyperParameters {
    /// Validates the combination; callers must not train with an unvalidated
    /// configuration.
    ///
    /// # Errors
    /// `ConfigError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hidden.is_empty() {
            return Err(ConfigError::new("hidden", "at least one hidden layer"));
        }
        if self.hidden.iter().any(|&h| h == 0) {
            return Err(ConfigError::new("hidden", "layer sizes must be positive"));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::new("rate", "must be positive and finite"));
        }
        if !self.rate_annealing.is_finite() || self.rate_annealing < 0.0 {
            return Err(ConfigError::new("rate_annealing", "must be non-negative"));
        }
        for (field, value) in [
            ("momentum_start", self.momentum_start),
            ("momentum_stable", self.momentum_stable),
        ] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ConfigError::new(field, "must lie in [0, 1)"));
            }
        }
        if !self.l1.is_finite() || self.l1 < 0.0 {
            return Err(ConfigError::new("l1", "must be non-negative"));
        }
        if !self.l2.is_finite() || self.l2 < 0.0 {
            return Err(ConfigError::new("l2", "must be non-negative"));
        }
        if self.max_w2.is_nan() || self.max_w2 <= 0.0 {
            return Err(ConfigError::new("max_w2", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.input_dropout_ratio) {
            return Err(ConfigError::new(
                "input_dropout_ratio",
                "must lie in [0, 1)",
            ));
        }
        if let InitialWeightDistribution::Uniform { scale }
        | InitialWeightDistribution::Normal { scale } = self.initial_weight_distribution
        {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::new(
                    "initial_weight_distribution",
                    "scale must be positive",
                ));
            }
        }
        if self.loss == LossKind::CrossEntropy && !self.classification {
            return Err(ConfigError::new(
                "loss",
                "cross-entropy requires classification",
            ));
        }
        if !self.epochs.is_finite() || self.epochs <= 0.0 {
            return Err(ConfigError::new("epochs", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        HyperParameters::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_hidden_units() {
        let params = HyperParameters {
            hidden: vec![10, 0, 5],
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "hidden");
    }

    #[test]
    fn rejects_negative_rate() {
        let params = HyperParameters {
            rate: -0.1,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "rate");
    }

    #[test]
    fn rejects_cross_entropy_regression() {
        let params = HyperParameters {
            classification: false,
            loss: LossKind::CrossEntropy,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "loss");
    }

    #[test]
    fn rejects_dropout_of_one() {
        let params = HyperParameters {
            input_dropout_ratio: 1.0,
            ..Default::default()
        };
        assert_eq!(
            params.validate().unwrap_err().field,
            "input_dropout_ratio"
        );
    }

    #[test]
    fn rejects_fractional_epochs_of_zero() {
        let params = HyperParameters {
            epochs: 0.0,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "epochs");
    }
}
