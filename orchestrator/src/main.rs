//! Demo driver: registers two synthetic datasets, trains a classifier per a
//! JSON request (or a built-in default) and re-scores the result.
//!
//! Usage: `orchestrator [request.json]`, logging via `RUST_LOG`.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};

use ml_core::{Column, Frame};
use orchestrator::{
    ActivationConfig, ModeConfig, ParamsConfig, Registry, ScoreRequest, TrainRequest,
    TrainingService,
};
use training::{Capabilities, Monitor};

const FEATURES: usize = 4;
const CLASSES: usize = 3;

fn synthetic_frame(rows: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<Vec<f32>> = vec![Vec::with_capacity(rows); FEATURES + 1];

    for r in 0..rows {
        let class = r % CLASSES;
        for f in 0..FEATURES {
            let center = if f % CLASSES == class { 2.0 } else { -1.0 };
            columns[f].push(center + rng.random::<f32>() - 0.5);
        }
        columns[FEATURES].push(class as f32);
    }

    Frame::new(
        columns
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                if i == FEATURES {
                    Column::new("label", data)
                } else {
                    Column::new(format!("x{i}"), data)
                }
            })
            .collect(),
    )
    .expect("synthetic frame is well formed")
}

fn default_request() -> TrainRequest {
    TrainRequest {
        train: "demo_train".into(),
        validation: Some("demo_valid".into()),
        destination: "demo_model".into(),
        response: FEATURES,
        ignored_cols: Vec::new(),
        mode: ModeConfig::SingleNode { workers: None },
        params: ParamsConfig {
            activation: ActivationConfig::RectifierWithDropout,
            input_dropout_ratio: 0.2,
            hidden: vec![16, 16],
            rate: 0.02,
            momentum_start: 0.5,
            momentum_ramp: 5_000,
            momentum_stable: 0.9,
            seed: 98_037_452_452,
            epochs: 20.0,
            ..Default::default()
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let request = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => default_request(),
    };

    let registry = Arc::new(Registry::new());
    registry.insert_frame("demo_train", synthetic_frame(600, 1));
    registry.insert_frame("demo_valid", synthetic_frame(240, 2));

    let service = TrainingService::new(Arc::clone(&registry), Capabilities::this_build());
    let job = service.submit(&request)?;

    let report = Monitor::new(Duration::from_millis(100))
        .wait(&job, Duration::from_secs(600))
        .await?;
    println!("job `{}` finished: {:?}", request.destination, report.state);

    if let Some(error) = job.error() {
        println!("recorded error: {error}");
        return Ok(());
    }
    if let Some(last) = report.snapshots.last() {
        println!(
            "final validation error {:.4} after epoch {} ({:?})",
            last.error_rate, last.epoch, last.elapsed
        );
    }

    let scored = service.score(&ScoreRequest {
        model: request.destination.clone(),
        source: request
            .validation
            .clone()
            .unwrap_or_else(|| request.train.clone()),
        response: request.response,
        ignored_cols: request.ignored_cols.clone(),
    })?;
    println!(
        "re-scored: error {:.4} over {} rows",
        scored.error_rate, scored.rows_scored
    );

    Ok(())
}
