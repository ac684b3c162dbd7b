use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use ml_core::{ColumnRoles, NeuralNet};
use training::{Capabilities, JobHandle, ScoreResult, TrainData, Trainer};

use crate::{
    configs::{ScoreRequest, TrainRequest},
    OrchestrationError, Registry,
};

/// The training and scoring request surface.
///
/// Submission is asynchronous: `submit` validates everything up front, fails
/// fast without creating a job, and otherwise returns a handle immediately.
/// Scoring is synchronous. Capabilities are injected per service instance,
/// never read from process-wide state.
pub struct TrainingService {
    registry: Arc<Registry>,
    capabilities: Capabilities,
    jobs: Mutex<HashMap<String, JobHandle>>,
}

impl TrainingService {
    pub fn new(registry: Arc<Registry>, capabilities: Capabilities) -> Self {
        Self {
            registry,
            capabilities,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Validates and launches a training job.
    ///
    /// Must be called within a tokio runtime. The job is tracked under the
    /// request's destination key; the trained model is published to the
    /// registry once the job completes.
    ///
    /// # Errors
    /// Configuration, capability and key-resolution errors, all before any
    /// job is created.
    pub fn submit(&self, request: &TrainRequest) -> Result<JobHandle, OrchestrationError> {
        let mode = request
            .mode
            .to_mode()
            .map_err(training::SetupError::Config)?;
        let params = request.params.to_hyperparams();

        // Config and capability checks fail before any dataset is touched.
        let trainer = Trainer::new(params, mode, &self.capabilities)?;

        let train = self
            .registry
            .frame(&request.train)
            .ok_or_else(|| OrchestrationError::UnknownFrame {
                key: request.train.clone(),
            })?;
        let valid = request
            .validation
            .as_ref()
            .map(|key| {
                self.registry
                    .frame(key)
                    .ok_or_else(|| OrchestrationError::UnknownFrame { key: key.clone() })
            })
            .transpose()?;

        let roles = ColumnRoles::new(request.response, request.ignored_cols.iter().copied());
        let data = TrainData::new(train, valid, roles, trainer.params().classification)?;
        let net = trainer.build_net(&data);

        log::info!(
            "submitting job `{}`: mode {}, {} features, {} outputs",
            request.destination,
            trainer.mode().kind(),
            data.feature_width(),
            data.outputs()
        );

        let handle = training::launch(trainer, net, data);
        self.jobs
            .lock()
            .insert(request.destination.clone(), handle.clone());
        Ok(handle)
    }

    /// The job tracked under a destination key, if any.
    pub fn job(&self, destination: &str) -> Option<JobHandle> {
        self.jobs.lock().get(destination).cloned()
    }

    /// Resolves a model by key.
    ///
    /// Completed jobs transfer their model into the registry the first time
    /// it is asked for; until a job completes its key resolves to nothing.
    pub fn model(&self, key: &str) -> Option<Arc<NeuralNet>> {
        if let Some(model) = self.registry.model(key) {
            return Some(model);
        }

        let model = self.jobs.lock().get(key).and_then(JobHandle::model)?;
        self.registry.insert_model(key, Arc::clone(&model));
        Some(model)
    }

    /// Scores a registered model against a registered dataset, synchronously.
    ///
    /// # Errors
    /// Unknown keys, unusable column roles, or a schema/model width mismatch.
    pub fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, OrchestrationError> {
        let model = self
            .model(&request.model)
            .ok_or_else(|| OrchestrationError::UnknownModel {
                key: request.model.clone(),
            })?;
        let frame = self
            .registry
            .frame(&request.source)
            .ok_or_else(|| OrchestrationError::UnknownFrame {
                key: request.source.clone(),
            })?;

        let roles = ColumnRoles::new(request.response, request.ignored_cols.iter().copied());
        let layout = roles
            .layout(&frame)
            .map_err(training::SetupError::Frame)?;

        Ok(training::score(&model, &frame, &layout)?)
    }
}
