use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;

use ml_core::{HyperParameters, NeuralNet};

use crate::{
    trainer::{RunObserver, TrainData, Trainer},
    TrainError,
};

/// Lifecycle of an asynchronous training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Validation error recorded after one completed epoch. The last snapshot is
/// authoritative for the job's final error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSnapshot {
    /// 1-based epoch index.
    pub epoch: usize,
    pub error_rate: f32,
    pub elapsed: Duration,
}

struct JobStatus {
    state: JobState,
    snapshots: Vec<ValidationSnapshot>,
    error: Option<TrainError>,
    model: Option<Arc<NeuralNet>>,
}

struct JobShared {
    status: Mutex<JobStatus>,
    cancel: AtomicBool,
    params: HyperParameters,
}

impl RunObserver for JobShared {
    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn on_snapshot(&self, snapshot: &ValidationSnapshot) {
        self.status.lock().snapshots.push(snapshot.clone());
    }
}

/// Shared, cloneable view of a training job.
///
/// Runtime errors never cross the async boundary: they are recorded here and
/// the state moves to `Failed`.
#[derive(Clone)]
pub struct JobHandle {
    shared: Arc<JobShared>,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl JobHandle {
    pub fn state(&self) -> JobState {
        self.shared.status.lock().state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// All snapshots recorded so far, oldest first.
    pub fn snapshots(&self) -> Vec<ValidationSnapshot> {
        self.shared.status.lock().snapshots.clone()
    }

    pub fn last_snapshot(&self) -> Option<ValidationSnapshot> {
        self.shared.status.lock().snapshots.last().cloned()
    }

    /// The error that failed the job, if any.
    pub fn error(&self) -> Option<TrainError> {
        self.shared.status.lock().error.clone()
    }

    /// The trained model. `Some` only once the job completed; until then the
    /// trainer exclusively owns the weights, so no half-updated state is ever
    /// observable here.
    pub fn model(&self) -> Option<Arc<NeuralNet>> {
        self.shared.status.lock().model.clone()
    }

    pub fn hyperparams(&self) -> &HyperParameters {
        &self.shared.params
    }

    /// Requests cooperative cancellation. The trainer honors it at the next
    /// epoch boundary; a job that finishes first stays `Completed`.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }
}

/// Submits a training run onto the blocking pool and returns its handle
/// immediately.
///
/// Must be called within a tokio runtime. The network is owned by the
/// training task until the job reaches a terminal state; on completion it is
/// published read-only through [`JobHandle::model`].
pub fn launch(trainer: Trainer, mut net: NeuralNet, data: TrainData) -> JobHandle {
    let shared = Arc::new(JobShared {
        status: Mutex::new(JobStatus {
            state: JobState::Queued,
            snapshots: Vec::new(),
            error: None,
            model: None,
        }),
        cancel: AtomicBool::new(false),
        params: trainer.params().clone(),
    });

    let worker = Arc::clone(&shared);
    tokio::task::spawn_blocking(move || {
        worker.status.lock().state = JobState::Running;

        let result = trainer.run_observed(&mut net, &data, &*worker);

        let mut status = worker.status.lock();
        match result {
            Ok(_) => {
                status.model = Some(Arc::new(net));
                status.state = JobState::Completed;
            }
            Err(TrainError::Cancelled) => {
                status.state = JobState::Cancelled;
            }
            Err(error) => {
                log::warn!("training job failed: {error}");
                status.error = Some(error);
                status.state = JobState::Failed;
            }
        }
    });

    JobHandle { shared }
}
