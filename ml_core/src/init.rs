use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

/// Initial weight sampling policy.
///
/// `UniformAdaptive` scales the range per layer from fan-in and fan-out, so a
/// fixed seed plus a fixed topology reproduces the initial weights exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialWeightDistribution {
    /// Uniform in `±sqrt(6 / (fan_in + fan_out))`.
    UniformAdaptive,
    /// Uniform in `±scale`.
    Uniform { scale: f32 },
    /// Normal with mean 0 and standard deviation `scale`.
    Normal { scale: f32 },
}

impl InitialWeightDistribution {
    /// Fills one layer's weight matrix, consuming the shared rng in order.
    ///
    /// Biases start at zero and are not sampled.
    pub fn fill_layer<R: Rng>(self, rng: &mut R, weights: &mut Array2<f32>) {
        let (fan_out, fan_in) = weights.dim();
        match self {
            InitialWeightDistribution::UniformAdaptive => {
                let range = (6.0 / (fan_in + fan_out) as f32).sqrt();
                let dist = Uniform::new_inclusive(-range, range)
                    .expect("adaptive range is finite and ordered");
                weights.iter_mut().for_each(|w| *w = dist.sample(rng));
            }
            InitialWeightDistribution::Uniform { scale } => {
                let dist = Uniform::new_inclusive(-scale, scale)
                    .expect("uniform scale must be non-negative and finite");
                weights.iter_mut().for_each(|w| *w = dist.sample(rng));
            }
            InitialWeightDistribution::Normal { scale } => {
                let dist = Normal::new(0.0, scale).expect("normal scale must be finite");
                weights.iter_mut().for_each(|w| *w = dist.sample(rng));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn adaptive_range_shrinks_with_fan() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut wide = Array2::zeros((4, 1000));
        InitialWeightDistribution::UniformAdaptive.fill_layer(&mut rng, &mut wide);

        let bound = (6.0f32 / 1004.0).sqrt();
        assert!(wide.iter().all(|w| w.abs() <= bound));
        assert!(wide.iter().any(|w| *w != 0.0));
    }

    #[test]
    fn same_seed_same_weights() {
        let mut a = Array2::zeros((3, 5));
        let mut b = Array2::zeros((3, 5));

        let mut rng = StdRng::seed_from_u64(42);
        InitialWeightDistribution::Normal { scale: 0.1 }.fill_layer(&mut rng, &mut a);
        let mut rng = StdRng::seed_from_u64(42);
        InitialWeightDistribution::Normal { scale: 0.1 }.fill_layer(&mut rng, &mut b);

        assert_eq!(a, b);
    }
}
