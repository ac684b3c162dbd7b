use std::sync::Arc;
use std::time::Instant;

use ml_core::{ColumnRoles, FeatureLayout, Frame, HyperParameters, NeuralNet};

use crate::{
    job::ValidationSnapshot,
    scorer,
    strategy::{Capabilities, EpochCtx, EpochRunner, ExecutionMode},
    SetupError, TrainError,
};

/// The datasets one job trains against, with roles resolved up front.
///
/// Both frames are read-only and shared; the validation frame is never
/// touched by training itself, only scored.
pub struct TrainData {
    train: Arc<Frame>,
    valid: Option<Arc<Frame>>,
    layout: FeatureLayout,
    outputs: usize,
}

impl std::fmt::Debug for TrainData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainData")
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl TrainData {
    /// Resolves `roles` against the frames and fixes the output width.
    ///
    /// # Errors
    /// `SetupError::Frame` when the response is not a usable column of the
    /// train frame, `SetupError::SchemaMismatch` when the validation frame
    /// disagrees on column count.
    pub fn new(
        train: Arc<Frame>,
        valid: Option<Arc<Frame>>,
        roles: ColumnRoles,
        classification: bool,
    ) -> Result<Self, SetupError> {
        let layout = roles.layout(&train)?;

        if let Some(valid) = &valid {
            if valid.cols() != train.cols() {
                return Err(SetupError::SchemaMismatch {
                    train_cols: train.cols(),
                    valid_cols: valid.cols(),
                });
            }
        }

        let outputs = if classification {
            layout.class_count(&train)?
        } else {
            1
        };

        Ok(Self {
            train,
            valid,
            layout,
            outputs,
        })
    }

    #[inline]
    pub fn train_frame(&self) -> &Arc<Frame> {
        &self.train
    }

    #[inline]
    pub fn validation_frame(&self) -> Option<&Arc<Frame>> {
        self.valid.as_ref()
    }

    #[inline]
    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Model input width.
    #[inline]
    pub fn feature_width(&self) -> usize {
        self.layout.width()
    }

    /// Model output width: class count or 1 for regression.
    #[inline]
    pub fn outputs(&self) -> usize {
        self.outputs
    }
}

/// Observes a run from outside the training thread.
pub(crate) trait RunObserver: Sync {
    fn cancel_requested(&self) -> bool {
        false
    }
    fn on_snapshot(&self, _snapshot: &ValidationSnapshot) {}
}

pub(crate) struct NoObserver;

impl RunObserver for NoObserver {}

/// The coordinator: owns the epoch loop, delegates per-epoch work to the
/// execution mode, applies the schedules through the kernel, and scores the
/// validation frame after each full epoch.
pub struct Trainer {
    params: HyperParameters,
    mode: ExecutionMode,
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer").finish_non_exhaustive()
    }
}

impl Trainer {
    /// Validates the configuration and the requested capability. Fails fast:
    /// no job is created for an invalid request.
    pub fn new(
        params: HyperParameters,
        mode: ExecutionMode,
        capabilities: &Capabilities,
    ) -> Result<Self, SetupError> {
        params.validate()?;
        if !capabilities.supports(&mode) {
            return Err(SetupError::CapabilityUnavailable { mode: mode.kind() });
        }
        Ok(Self { params, mode })
    }

    #[inline]
    pub fn params(&self) -> &HyperParameters {
        &self.params
    }

    #[inline]
    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Builds the initial network for `data` from the configured topology,
    /// seed and weight distribution.
    pub fn build_net(&self, data: &TrainData) -> NeuralNet {
        NeuralNet::new(
            data.feature_width(),
            &self.params.hidden,
            data.outputs(),
            self.params.activation,
            self.params.classification,
            self.params.initial_weight_distribution,
            self.params.seed,
        )
    }

    /// Synchronous training; the caller owns the network throughout.
    pub fn run(
        &self,
        net: &mut NeuralNet,
        data: &TrainData,
    ) -> Result<Vec<ValidationSnapshot>, TrainError> {
        self.run_observed(net, data, &NoObserver)
    }

    pub(crate) fn run_observed(
        &self,
        net: &mut NeuralNet,
        data: &TrainData,
        observer: &dyn RunObserver,
    ) -> Result<Vec<ValidationSnapshot>, TrainError> {
        let total_rows = data.train.rows();
        // Fractional epochs: the budget is a sample count, the last epoch
        // processes whatever prefix remains.
        let budget = (self.params.epochs * total_rows as f64).round().max(1.0) as u64;

        let mut runner = EpochRunner::new(&self.mode, net, &self.params);
        let mut snapshots = Vec::new();
        let mut samples_seen = 0u64;
        let mut epoch = 0usize;
        let start = Instant::now();

        log::info!(
            "training started: mode {}, {} rows, budget {} samples",
            self.mode.kind(),
            total_rows,
            budget
        );

        while samples_seen < budget {
            // Cooperative cancellation, only at epoch boundaries.
            if observer.cancel_requested() {
                log::info!("cancellation observed at epoch boundary {epoch}");
                return Err(TrainError::Cancelled);
            }

            let rows = (budget - samples_seen).min(total_rows as u64) as usize;
            let ctx = EpochCtx {
                frame: &data.train,
                layout: &data.layout,
                params: &self.params,
                epoch,
                samples_seen,
                rows,
            };

            let mean_loss = runner.run_epoch(net, &ctx)?;
            samples_seen += rows as u64;

            if !mean_loss.is_finite() || !net.is_finite() {
                log::warn!("non-finite state after epoch {epoch}, failing job");
                return Err(TrainError::Diverged { epoch });
            }

            if let Some(valid) = &data.valid {
                let scored = scorer::score(net, valid, &data.layout)?;
                let snapshot = ValidationSnapshot {
                    epoch: epoch + 1,
                    error_rate: scored.error_rate,
                    elapsed: start.elapsed(),
                };
                log::info!(
                    "epoch {}: train loss {:.6}, validation error {:.6}",
                    epoch + 1,
                    mean_loss,
                    snapshot.error_rate
                );
                observer.on_snapshot(&snapshot);
                snapshots.push(snapshot);
            } else {
                log::info!("epoch {}: train loss {:.6}", epoch + 1, mean_loss);
            }

            epoch += 1;
        }

        Ok(snapshots)
    }
}
