use ml_core::{HyperParameters, NeuralNet};

use super::EpochCtx;
use crate::{sgd, sgd::SgdKernel, TrainError};

/// One shard, one kernel. Rows are processed in order and the momentum state
/// lives for the whole run, so a fixed seed reproduces the result exactly.
pub(crate) struct SingleThread {
    kernel: SgdKernel,
}

impl SingleThread {
    pub fn new(net: &NeuralNet, params: &HyperParameters) -> Self {
        Self {
            kernel: SgdKernel::new(net, sgd::derive_seed(params.seed, 0, 0)),
        }
    }

    pub fn run_epoch(&mut self, net: &mut NeuralNet, ctx: &EpochCtx<'_>) -> Result<f64, TrainError> {
        let mut loss_sum = 0.0f64;
        let mut samples = ctx.samples_seen;

        for row in 0..ctx.rows {
            loss_sum +=
                self.kernel
                    .train_row(net, ctx.frame, ctx.layout, row, ctx.params, samples)
                    as f64;
            samples += 1;
        }

        Ok(loss_sum / ctx.rows.max(1) as f64)
    }
}
