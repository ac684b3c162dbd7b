use ndarray::{linalg::general_mat_vec_mul, Array1, Array2, ArrayView1};
use rand::{rngs::StdRng, SeedableRng};

use crate::{Activation, InitialWeightDistribution};

/// One fully connected layer: a weight matrix (out × in) and a bias vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl Layer {
    fn new(out_units: usize, in_units: usize) -> Self {
        Self {
            weights: Array2::zeros((out_units, in_units)),
            bias: Array1::zeros(out_units),
        }
    }

    #[inline]
    pub fn out_units(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn in_units(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Mutable weight access for the trainer; the model is exclusively owned
    /// while training, read-only afterwards.
    #[inline]
    pub fn weights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weights
    }

    #[inline]
    pub fn bias_mut(&mut self) -> &mut Array1<f32> {
        &mut self.bias
    }
}

/// The parameter container: an ordered sequence of layers plus the fixed
/// pieces of configuration the forward pass needs.
///
/// The output layer is softmax for classification and linear otherwise;
/// hidden layers use `activation`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNet {
    layers: Vec<Layer>,
    activation: Activation,
    classification: bool,
}

impl NeuralNet {
    /// Builds and initializes a network.
    ///
    /// A single `StdRng` seeded with `seed` drives all layer draws in order,
    /// so identical seed and topology reproduce identical initial weights.
    ///
    /// # Panics
    /// If `inputs`, `outputs` or any hidden size is zero; hyperparameter
    /// validation rejects those before a network is ever built.
    pub fn new(
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
        activation: Activation,
        classification: bool,
        init: InitialWeightDistribution,
        seed: u64,
    ) -> Self {
        assert!(inputs > 0 && outputs > 0, "degenerate topology");
        assert!(hidden.iter().all(|&h| h > 0), "degenerate topology");

        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = inputs;

        for &units in hidden.iter().chain(std::iter::once(&outputs)) {
            let mut layer = Layer::new(units, fan_in);
            init.fill_layer(&mut rng, &mut layer.weights);
            layers.push(layer);
            fan_in = units;
        }

        Self {
            layers,
            activation,
            classification,
        }
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.layers[0].in_units()
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.layers.last().expect("at least one layer").out_units()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn is_classification(&self) -> bool {
        self.classification
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Runs the forward pass over whatever input is currently loaded in
    /// `state`, filling per-layer pre-activations and activations.
    ///
    /// Dropout is not applied here; training masks the input buffer before
    /// calling this, inference never does.
    pub fn forward(&self, state: &mut ForwardState) {
        for (i, layer) in self.layers.iter().enumerate() {
            let (done, rest) = state.activations.split_at_mut(i + 1);
            let input = &done[i];
            let z = &mut state.zs[i];

            general_mat_vec_mul(1.0, &layer.weights, input, 0.0, z);
            *z += &layer.bias;

            let out = &mut rest[0];
            if i + 1 == self.layers.len() {
                if self.classification {
                    softmax(z.as_slice().expect("contiguous"), out.as_slice_mut().expect("contiguous"));
                } else {
                    out.assign(z);
                }
            } else {
                out.zip_mut_with(&*z, |a, &zv| *a = self.activation.f(zv));
            }
        }
    }

    /// Inference-mode prediction for one feature row.
    ///
    /// # Panics
    /// If `features.len() != self.inputs()`.
    pub fn predict_into(&self, features: &[f32], state: &mut ForwardState) {
        state.load_input(features);
        self.forward(state);
    }

    /// True while every weight and bias is finite.
    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(|layer| {
            layer.weights.iter().all(|w| w.is_finite())
                && layer.bias.iter().all(|b| b.is_finite())
        })
    }
}

/// Reusable per-layer buffers for one forward pass, sized to one network
/// topology. Keeping them out of `NeuralNet` lets many workers evaluate the
/// same shared model concurrently.
#[derive(Debug, Clone)]
pub struct ForwardState {
    /// Pre-activations, one per layer.
    zs: Vec<Array1<f32>>,
    /// `activations[0]` is the input row, `activations[i + 1]` the output of
    /// layer `i`.
    activations: Vec<Array1<f32>>,
}

impl ForwardState {
    pub fn new(net: &NeuralNet) -> Self {
        let zs = net
            .layers
            .iter()
            .map(|l| Array1::zeros(l.out_units()))
            .collect();
        let activations = std::iter::once(Array1::zeros(net.inputs()))
            .chain(net.layers.iter().map(|l| Array1::zeros(l.out_units())))
            .collect();
        Self { zs, activations }
    }

    /// Copies a feature row into the input slot.
    ///
    /// # Panics
    /// If the row width doesn't match the network input width.
    pub fn load_input(&mut self, features: &[f32]) {
        let input = self.activations[0]
            .as_slice_mut()
            .expect("contiguous input buffer");
        input.copy_from_slice(features);
    }

    /// Mutable input buffer, used by training to apply the dropout mask.
    #[inline]
    pub fn input_mut(&mut self) -> &mut [f32] {
        self.activations[0]
            .as_slice_mut()
            .expect("contiguous input buffer")
    }

    /// Output of the last layer after `forward`.
    #[inline]
    pub fn output(&self) -> ArrayView1<'_, f32> {
        self.activations.last().expect("nonempty").view()
    }

    /// Pre-activation of layer `i`.
    #[inline]
    pub fn z(&self, i: usize) -> ArrayView1<'_, f32> {
        self.zs[i].view()
    }

    /// Activation entering layer `i` (`i == 0` is the input row).
    #[inline]
    pub fn activation(&self, i: usize) -> ArrayView1<'_, f32> {
        self.activations[i].view()
    }
}

/// Numerically stable softmax: shifts by the max before exponentiating.
fn softmax(z: &[f32], out: &mut [f32]) {
    let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for (o, &v) in out.iter_mut().zip(z) {
        let e = (v - max).exp();
        *o = e;
        sum += e;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_net(seed: u64) -> NeuralNet {
        NeuralNet::new(
            3,
            &[4, 2],
            2,
            Activation::Rectifier,
            true,
            InitialWeightDistribution::UniformAdaptive,
            seed,
        )
    }

    #[test]
    fn topology_matches_request() {
        let net = tiny_net(1);
        assert_eq!(net.inputs(), 3);
        assert_eq!(net.outputs(), 2);
        assert_eq!(net.layers().len(), 3);
        assert_eq!(net.layers()[1].in_units(), 4);
        assert_eq!(net.layers()[1].out_units(), 2);
    }

    #[test]
    fn same_seed_reproduces_weights() {
        assert_eq!(tiny_net(98), tiny_net(98));
    }

    #[test]
    fn different_seed_differs() {
        assert_ne!(tiny_net(98), tiny_net(99));
    }

    #[test]
    fn biases_start_at_zero() {
        let net = tiny_net(5);
        assert!(net
            .layers()
            .iter()
            .all(|l| l.bias().iter().all(|&b| b == 0.0)));
    }

    #[test]
    fn classification_output_is_a_distribution() {
        let net = tiny_net(3);
        let mut state = ForwardState::new(&net);
        net.predict_into(&[0.5, -1.0, 2.0], &mut state);

        let out = state.output();
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(out.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn regression_output_is_linear() {
        let net = NeuralNet::new(
            2,
            &[3],
            1,
            Activation::Tanh,
            false,
            InitialWeightDistribution::Uniform { scale: 0.5 },
            11,
        );
        let mut state = ForwardState::new(&net);
        net.predict_into(&[1.0, -1.0], &mut state);
        // Linear output equals its own pre-activation.
        assert_eq!(state.output()[0], state.z(1)[0]);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let z = [1000.0f32, 1001.0, 999.0];
        let mut out = [0.0f32; 3];
        softmax(&z, &mut out);
        assert!(out.iter().all(|p| p.is_finite()));
        assert!((out.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}
