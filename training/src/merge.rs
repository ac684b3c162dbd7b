//! The reduction combine for replica training.
//!
//! A `PartialFit` is a sample-weighted sum of replica parameters. Merging two
//! partials adds their sums and counts, which is associative and commutative,
//! so the reduced result does not depend on the order replicas report in.
//! SingleNode uses it at epoch boundaries; a multi-node reduction would use
//! the same operation over the network.

use ndarray::{Array1, Array2};
use ml_core::NeuralNet;

#[derive(Debug, Clone)]
pub(crate) struct PartialFit {
    weights: Vec<Array2<f32>>,
    biases: Vec<Array1<f32>>,
    samples: u64,
}

impl PartialFit {
    /// Captures one replica's parameters, weighted by how many samples the
    /// replica trained on.
    pub fn from_replica(net: &NeuralNet, samples: u64) -> Self {
        let scale = samples as f32;
        let weights = net
            .layers()
            .iter()
            .map(|l| l.weights() * scale)
            .collect();
        let biases = net.layers().iter().map(|l| l.bias() * scale).collect();
        Self {
            weights,
            biases,
            samples,
        }
    }

    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Combines two partials. Associative and commutative up to float
    /// rounding.
    ///
    /// # Panics
    /// If the two partials come from different topologies.
    pub fn merge(mut self, other: PartialFit) -> PartialFit {
        assert_eq!(self.weights.len(), other.weights.len(), "topology mismatch");
        for (w, ow) in self.weights.iter_mut().zip(&other.weights) {
            *w += ow;
        }
        for (b, ob) in self.biases.iter_mut().zip(&other.biases) {
            *b += ob;
        }
        self.samples += other.samples;
        self
    }

    /// Resolves the weighted sum into `net` as a plain average.
    ///
    /// # Panics
    /// If no samples were accumulated or topologies differ.
    pub fn apply_to(self, net: &mut NeuralNet) {
        assert!(self.samples > 0, "cannot average an empty reduction");
        let inv = 1.0 / self.samples as f32;

        for (layer, (w, b)) in net
            .layers_mut()
            .iter_mut()
            .zip(self.weights.into_iter().zip(self.biases))
        {
            layer.weights_mut().assign(&(w * inv));
            layer.bias_mut().assign(&(b * inv));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_core::{Activation, InitialWeightDistribution, NeuralNet};

    fn replica(seed: u64) -> NeuralNet {
        NeuralNet::new(
            3,
            &[4],
            2,
            Activation::Rectifier,
            true,
            InitialWeightDistribution::Uniform { scale: 0.5 },
            seed,
        )
    }

    fn max_weight_gap(a: &NeuralNet, b: &NeuralNet) -> f32 {
        a.layers()
            .iter()
            .zip(b.layers())
            .flat_map(|(la, lb)| {
                la.weights()
                    .iter()
                    .zip(lb.weights().iter())
                    .map(|(x, y)| (x - y).abs())
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn merge_is_order_invariant() {
        let nets: Vec<_> = (0..3).map(replica).collect();
        let counts = [10u64, 7, 13];

        let orderings: [[usize; 3]; 3] = [[0, 1, 2], [2, 0, 1], [1, 2, 0]];
        let mut reduced = Vec::new();

        for order in orderings {
            let mut acc: Option<PartialFit> = None;
            for &i in &order {
                let part = PartialFit::from_replica(&nets[i], counts[i]);
                acc = Some(match acc {
                    Some(a) => a.merge(part),
                    None => part,
                });
            }
            let mut out = replica(99);
            acc.unwrap().apply_to(&mut out);
            reduced.push(out);
        }

        assert!(max_weight_gap(&reduced[0], &reduced[1]) < 1e-6);
        assert!(max_weight_gap(&reduced[0], &reduced[2]) < 1e-6);
    }

    #[test]
    fn merge_is_associative() {
        let nets: Vec<_> = (0..3).map(replica).collect();
        let part = |i: usize| PartialFit::from_replica(&nets[i], 5);

        let left = part(0).merge(part(1)).merge(part(2));
        let right = part(0).merge(part(1).merge(part(2)));

        let mut a = replica(99);
        let mut b = replica(99);
        left.apply_to(&mut a);
        right.apply_to(&mut b);

        assert!(max_weight_gap(&a, &b) < 1e-6);
    }

    #[test]
    fn average_weighs_by_sample_count() {
        let a = replica(1);
        // A replica that saw three times the data dominates the average.
        let merged = PartialFit::from_replica(&a, 3).merge(PartialFit::from_replica(&replica(2), 1));
        assert_eq!(merged.samples(), 4);

        let mut out = replica(99);
        merged.apply_to(&mut out);

        let expected = 0.75 * a.layers()[0].weights()[[0, 0]]
            + 0.25 * replica(2).layers()[0].weights()[[0, 0]];
        assert!((out.layers()[0].weights()[[0, 0]] - expected).abs() < 1e-6);
    }
}
