use std::sync::Arc;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::time::sleep;

use ml_core::{
    Activation, Column, ColumnRoles, Frame, HyperParameters, InitialWeightDistribution, LossKind,
};
use training::{
    launch, Capabilities, ExecutionMode, JobState, Monitor, MonitorError, TrainData, TrainError,
    Trainer,
};

fn two_blob_frame(rows: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x0 = Vec::with_capacity(rows);
    let mut x1 = Vec::with_capacity(rows);
    let mut label = Vec::with_capacity(rows);

    for r in 0..rows {
        let class = r % 2;
        let center = if class == 0 { -2.0 } else { 2.0 };
        x0.push(center + rng.random::<f32>() - 0.5);
        x1.push(center + rng.random::<f32>() - 0.5);
        label.push(class as f32);
    }

    Frame::new(vec![
        Column::new("x0", x0),
        Column::new("x1", x1),
        Column::new("label", label),
    ])
    .unwrap()
}

fn classification_data() -> TrainData {
    TrainData::new(
        Arc::new(two_blob_frame(200, 3)),
        Some(Arc::new(two_blob_frame(80, 4))),
        ColumnRoles::new(2, []),
        true,
    )
    .unwrap()
}

fn params(epochs: f64) -> HyperParameters {
    HyperParameters {
        activation: Activation::Tanh,
        hidden: vec![6],
        rate: 0.02,
        seed: 7,
        epochs,
        ..Default::default()
    }
}

fn start_job(params: HyperParameters, data: TrainData) -> training::JobHandle {
    let trainer = Trainer::new(
        params,
        ExecutionMode::SingleThread,
        &Capabilities::this_build(),
    )
    .unwrap();
    let net = trainer.build_net(&data);
    launch(trainer, net, data)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn completed_job_publishes_its_model() {
    let job = start_job(params(5.0), classification_data());

    let report = Monitor::new(Duration::from_millis(5))
        .wait(&job, Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.snapshots.len(), 5);
    assert!(job.model().is_some());
    assert!(job.error().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_lands_on_an_epoch_boundary() {
    let job = start_job(params(100_000.0), classification_data());

    // Let at least one epoch complete so cancellation hits a boundary.
    while job.snapshots().is_empty() {
        sleep(Duration::from_millis(2)).await;
    }
    job.cancel();

    while !job.is_finished() {
        sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(job.state(), JobState::Cancelled);
    // A cancelled job never publishes a model.
    assert!(job.model().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn monitor_timeout_leaves_the_job_running() {
    let job = start_job(params(100_000.0), classification_data());

    let err = Monitor::new(Duration::from_millis(5))
        .wait(&job, Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, MonitorError::Timeout { .. }));
    assert!(!job.is_finished(), "timeout must not stop the job");

    job.cancel();
    while !job.is_finished() {
        sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(job.state(), JobState::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn divergence_fails_the_job_with_its_error_recorded() {
    // Regression with an absurd learning rate blows the weights up fast.
    let rows = 100;
    let xs: Vec<f32> = (0..rows).map(|i| i as f32).collect();
    let ys: Vec<f32> = xs.iter().map(|x| 3.0 * x).collect();
    let frame = Frame::new(vec![Column::new("x", xs), Column::new("y", ys)]).unwrap();

    let data = TrainData::new(Arc::new(frame), None, ColumnRoles::new(1, []), false).unwrap();
    let params = HyperParameters {
        activation: Activation::Rectifier,
        hidden: vec![4],
        rate: 1e6,
        loss: LossKind::MeanSquaredError,
        classification: false,
        initial_weight_distribution: InitialWeightDistribution::Uniform { scale: 0.5 },
        epochs: 10.0,
        seed: 1,
        ..Default::default()
    };

    let job = start_job(params, data);
    let report = Monitor::new(Duration::from_millis(5))
        .wait(&job, Duration::from_secs(30))
        .await
        .unwrap();

    assert_eq!(report.state, JobState::Failed);
    assert!(matches!(job.error(), Some(TrainError::Diverged { .. })));
    assert!(job.model().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshots_grow_while_the_job_runs() {
    let job = start_job(params(200.0), classification_data());

    while job.snapshots().len() < 2 && !job.is_finished() {
        sleep(Duration::from_millis(1)).await;
    }
    let early = job.snapshots().len();
    assert!(early >= 2);

    Monitor::new(Duration::from_millis(5))
        .wait(&job, Duration::from_secs(60))
        .await
        .unwrap();

    let all = job.snapshots();
    assert!(all.len() >= early);
    assert_eq!(all.len(), 200);
    // Epoch indices are 1-based and strictly increasing.
    for (i, snapshot) in all.iter().enumerate() {
        assert_eq!(snapshot.epoch, i + 1);
    }
}
