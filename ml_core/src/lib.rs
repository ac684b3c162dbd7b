mod activation;
mod error;
mod frame;
mod hyperparams;
mod init;
mod loss;
mod net;

pub use activation::Activation;
pub use error::{ConfigError, FrameError};
pub use frame::{Column, ColumnRoles, FeatureLayout, Frame};
pub use hyperparams::HyperParameters;
pub use init::InitialWeightDistribution;
pub use loss::LossKind;
pub use net::{ForwardState, Layer, NeuralNet};
