use std::num::NonZeroUsize;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use ml_core::{HyperParameters, NeuralNet};

use super::EpochCtx;
use crate::{merge::PartialFit, sgd, sgd::SgdKernel, shard, TrainError};

/// Shared-memory replica training.
///
/// Discipline: synchronous replica averaging. Each worker trains a private
/// copy of the network on its own contiguous shard for the epoch; at the
/// epoch boundary the replicas are reduced with the sample-weighted averaging
/// combine. Workers never touch shared weight state inside an epoch, so no
/// locking is needed and the merged result is reproducible for a fixed seed
/// and worker count.
///
/// The first `warmup_samples` rows of the run are trained on the primary
/// kernel before the pool fans out.
pub(crate) struct SingleNode {
    workers: usize,
    /// Kernel for warm-up prefixes; keeps its own momentum state.
    primary: SgdKernel,
}

impl SingleNode {
    pub fn new(net: &NeuralNet, params: &HyperParameters, workers: Option<NonZeroUsize>) -> Self {
        let workers = workers
            .map(NonZeroUsize::get)
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);

        Self {
            workers,
            primary: SgdKernel::new(net, sgd::derive_seed(params.seed, 0, 0)),
        }
    }

    pub fn run_epoch(&mut self, net: &mut NeuralNet, ctx: &EpochCtx<'_>) -> Result<f64, TrainError> {
        let mut loss_sum = 0.0f64;
        let mut first_row = 0usize;

        // Warm-up: sequential prefix until the configured sample count.
        if ctx.samples_seen < ctx.params.warmup_samples {
            let warmup_rows =
                ((ctx.params.warmup_samples - ctx.samples_seen) as usize).min(ctx.rows);
            for row in 0..warmup_rows {
                loss_sum += self.primary.train_row(
                    net,
                    ctx.frame,
                    ctx.layout,
                    row,
                    ctx.params,
                    ctx.samples_seen + row as u64,
                ) as f64;
            }
            first_row = warmup_rows;
        }

        let remaining = ctx.rows - first_row;
        if remaining == 0 {
            return Ok(loss_sum / ctx.rows.max(1) as f64);
        }

        let shards: Vec<Range<usize>> = shard::plan(remaining, self.workers)
            .into_iter()
            .map(|r| r.start + first_row..r.end + first_row)
            .collect();
        let sharded_base = ctx.samples_seen + first_row as u64;

        log::debug!(
            "epoch {}: {} shard(s) over rows {first_row}..{}",
            ctx.epoch,
            shards.len(),
            ctx.rows
        );

        // Workers read the epoch-start weights; nothing mutates `net` until
        // the reduction below.
        let frozen: &NeuralNet = net;
        let results: Vec<Result<(PartialFit, f64), TrainError>> = shards
            .par_iter()
            .enumerate()
            .map(|(worker, range)| {
                catch_unwind(AssertUnwindSafe(|| {
                    train_shard(frozen, ctx, worker, range.clone(), sharded_base)
                }))
                .map_err(|_| TrainError::ReductionFailure { worker })
            })
            .collect();

        // Reduce. Merging is associative and commutative; worker order here
        // is just the natural iteration order.
        let mut reduced: Option<PartialFit> = None;
        for result in results {
            let (fit, shard_loss) = result?;
            loss_sum += shard_loss;
            reduced = Some(match reduced {
                Some(acc) => acc.merge(fit),
                None => fit,
            });
        }

        reduced
            .expect("at least one shard per epoch")
            .apply_to(net);

        Ok(loss_sum / ctx.rows.max(1) as f64)
    }
}

/// Trains one replica over its shard and returns the weighted partial plus
/// the shard's summed loss.
fn train_shard(
    net: &NeuralNet,
    ctx: &EpochCtx<'_>,
    worker: usize,
    range: Range<usize>,
    sharded_base: u64,
) -> (PartialFit, f64) {
    let mut replica = net.clone();
    let mut kernel = SgdKernel::new(
        &replica,
        sgd::derive_seed(ctx.params.seed, ctx.epoch as u64 + 1, worker as u64 + 1),
    );

    let mut loss_sum = 0.0f64;
    let samples = range.len() as u64;

    for (offset, row) in range.enumerate() {
        loss_sum += kernel.train_row(
            &mut replica,
            ctx.frame,
            ctx.layout,
            row,
            ctx.params,
            sharded_base + offset as u64,
        ) as f64;
    }

    (PartialFit::from_replica(&replica, samples), loss_sum)
}
