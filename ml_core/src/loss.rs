use ndarray::ArrayView1;

/// Training loss kind.
///
/// `CrossEntropy` pairs with a softmax output layer (classification only);
/// `MeanSquaredError` pairs with a linear output layer. Both pairings share
/// the same output error signal `pred - target`, which keeps the backward
/// pass uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    CrossEntropy,
    MeanSquaredError,
}

impl LossKind {
    /// Per-sample loss for monitoring and divergence detection.
    pub fn loss(self, pred: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
        match self {
            LossKind::CrossEntropy => {
                let mut sum = 0.0;
                for (&p, &t) in pred.iter().zip(target.iter()) {
                    if t > 0.0 {
                        sum -= t * p.max(1e-15).ln();
                    }
                }
                sum
            }
            LossKind::MeanSquaredError => {
                let n = pred.len().max(1) as f32;
                pred.iter()
                    .zip(target.iter())
                    .map(|(&p, &t)| (p - t) * (p - t))
                    .sum::<f32>()
                    / n
            }
        }
    }

    /// Writes the output-layer error signal `dL/dz = pred - target`.
    pub fn output_delta(self, pred: ArrayView1<f32>, target: ArrayView1<f32>, out: &mut [f32]) {
        for ((o, &p), &t) in out.iter_mut().zip(pred.iter()).zip(target.iter()) {
            *o = p - t;
        }
    }
}
