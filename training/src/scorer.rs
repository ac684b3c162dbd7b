use ml_core::{FeatureLayout, ForwardState, Frame, NeuralNet};

use crate::ScoreError;

/// Outcome of scoring a model against one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    /// Misclassification fraction for classification models, mean squared
    /// error for regression models.
    pub error_rate: f32,
    pub rows_scored: usize,
}

/// Applies `net` to every row of `frame` in inference mode (no dropout, no
/// updates) and computes the same error metric training-time validation uses.
///
/// # Errors
/// `ScoreError::ShapeMismatch` when the layout's feature width differs from
/// the model's input width, `ScoreError::Frame` when the layout references
/// columns the frame lacks.
pub fn score(
    net: &NeuralNet,
    frame: &Frame,
    layout: &FeatureLayout,
) -> Result<ScoreResult, ScoreError> {
    layout.check(frame)?;
    if layout.width() != net.inputs() {
        return Err(ScoreError::ShapeMismatch {
            expected: net.inputs(),
            got: layout.width(),
        });
    }

    let rows = frame.rows();
    let mut state = ForwardState::new(net);
    let mut features = vec![0.0f32; layout.width()];

    let error_rate = if net.is_classification() {
        let mut errors = 0usize;
        for row in 0..rows {
            layout.fill_row(frame, row, &mut features);
            net.predict_into(&features, &mut state);

            let predicted = argmax(state.output().as_slice().expect("contiguous output"));
            let actual = layout.response_value(frame, row);
            if (actual - predicted as f32).abs() > 0.5 {
                errors += 1;
            }
        }
        errors as f32 / rows as f32
    } else {
        let mut sse = 0.0f64;
        for row in 0..rows {
            layout.fill_row(frame, row, &mut features);
            net.predict_into(&features, &mut state);

            let diff = state.output()[0] - layout.response_value(frame, row);
            sse += (diff as f64) * (diff as f64);
        }
        (sse / rows as f64) as f32
    };

    Ok(ScoreResult {
        error_rate,
        rows_scored: rows,
    })
}

/// Index of the largest value; first wins on ties.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
