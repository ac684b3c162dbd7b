use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationConfig {
    Tanh,
    TanhWithDropout,
    Rectifier,
    RectifierWithDropout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossConfig {
    CrossEntropy,
    MeanSquaredError,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightDistributionConfig {
    UniformAdaptive,
    Uniform { scale: f32 },
    Normal { scale: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModeConfig {
    SingleThread,
    SingleNode { workers: Option<usize> },
    MultiNode { nodes: usize },
}

/// Wire-level hyperparameters. Field meanings and defaults mirror
/// `ml_core::HyperParameters`; validation happens once at submission, not
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
    pub activation: ActivationConfig,
    pub hidden: Vec<usize>,
    pub rate: f32,
    pub rate_annealing: f32,
    pub momentum_start: f32,
    pub momentum_ramp: u64,
    pub momentum_stable: f32,
    pub l1: f32,
    pub l2: f32,
    pub max_w2: Option<f32>,
    pub input_dropout_ratio: f32,
    pub initial_weight_distribution: WeightDistributionConfig,
    pub seed: u64,
    pub loss: LossConfig,
    pub warmup_samples: u64,
    pub classification: bool,
    pub epochs: f64,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            activation: ActivationConfig::Rectifier,
            hidden: vec![200],
            rate: 0.005,
            rate_annealing: 1e-6,
            momentum_start: 0.0,
            momentum_ramp: 0,
            momentum_stable: 0.0,
            l1: 0.0,
            l2: 0.0,
            max_w2: None,
            input_dropout_ratio: 0.0,
            initial_weight_distribution: WeightDistributionConfig::UniformAdaptive,
            seed: 0,
            loss: LossConfig::CrossEntropy,
            warmup_samples: 0,
            classification: true,
            epochs: 10.0,
        }
    }
}

/// A training submission: dataset keys, column roles, execution mode and
/// hyperparameters, plus the key the trained model will be published under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub train: String,
    pub validation: Option<String>,
    pub destination: String,
    pub response: usize,
    #[serde(default)]
    pub ignored_cols: Vec<usize>,
    pub mode: ModeConfig,
    pub params: ParamsConfig,
}

/// A synchronous scoring request against a registered model and dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub model: String,
    pub source: String,
    pub response: usize,
    #[serde(default)]
    pub ignored_cols: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_request_parses_from_json() {
        let raw = r#"{
            "train": "mnist_train.hex",
            "validation": "mnist_test.hex",
            "destination": "nn_model.hex",
            "response": 784,
            "mode": { "kind": "single_thread" },
            "params": {
                "activation": "rectifier_with_dropout",
                "input_dropout_ratio": 0.2,
                "hidden": [117, 131, 129],
                "rate": 0.005,
                "rate_annealing": 1e-6,
                "momentum_start": 0.5,
                "momentum_ramp": 100000,
                "momentum_stable": 0.9,
                "l1": 0.00001,
                "l2": 0.0000001,
                "seed": 98037452452,
                "loss": "cross_entropy",
                "max_w2": 15.0,
                "epochs": 2.0
            }
        }"#;

        let request: TrainRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.response, 784);
        assert_eq!(request.params.hidden, vec![117, 131, 129]);
        assert_eq!(request.params.max_w2, Some(15.0));
        assert_eq!(
            request.params.activation,
            ActivationConfig::RectifierWithDropout
        );
        assert_eq!(request.mode, ModeConfig::SingleThread);
        // Fields left out fall back to defaults.
        assert_eq!(request.params.warmup_samples, 0);
        assert!(request.params.classification);
    }

    #[test]
    fn mode_config_distinguishes_variants() {
        let single: ModeConfig =
            serde_json::from_str(r#"{ "kind": "single_node", "workers": 4 }"#).unwrap();
        assert_eq!(single, ModeConfig::SingleNode { workers: Some(4) });

        let multi: ModeConfig =
            serde_json::from_str(r#"{ "kind": "multi_node", "nodes": 3 }"#).unwrap();
        assert_eq!(multi, ModeConfig::MultiNode { nodes: 3 });
    }
}
