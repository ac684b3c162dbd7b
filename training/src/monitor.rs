use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::{JobHandle, JobState, MonitorError, ValidationSnapshot};

/// Terminal view of a job as the monitor last saw it.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub state: JobState,
    pub snapshots: Vec<ValidationSnapshot>,
}

/// Polls a job at a bounded interval until it finishes or a caller-supplied
/// timeout elapses.
///
/// The monitor never owns cancellation: on timeout the job is left exactly as
/// it was, still running.
pub struct Monitor {
    interval: Duration,
}

impl Monitor {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Waits for `job` to reach a terminal state.
    ///
    /// Intermediate snapshots are surfaced through the log as they appear.
    ///
    /// # Errors
    /// `MonitorError::Timeout` when `timeout` elapses first; the job keeps
    /// running.
    pub async fn wait(
        &self,
        job: &JobHandle,
        timeout: Duration,
    ) -> Result<JobReport, MonitorError> {
        let deadline = Instant::now() + timeout;
        let mut reported = 0usize;

        loop {
            let snapshots = job.snapshots();
            for snapshot in &snapshots[reported..] {
                log::info!(
                    "job progress: epoch {} validation error {:.6}",
                    snapshot.epoch,
                    snapshot.error_rate
                );
            }
            reported = snapshots.len();

            let state = job.state();
            if state.is_terminal() {
                return Ok(JobReport { state, snapshots });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(MonitorError::Timeout { waited: timeout });
            }

            sleep(self.interval.min(deadline - now)).await;
        }
    }
}
