use ndarray::{linalg::general_mat_vec_mul, Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};

use ml_core::{FeatureLayout, ForwardState, Frame, HyperParameters, NeuralNet};

use crate::schedule;

/// Derives an independent rng stream for one worker in one epoch, so replica
/// dropout masks are reproducible from the configured seed alone.
pub(crate) fn derive_seed(seed: u64, epoch: u64, worker: u64) -> u64 {
    let mut x = seed
        ^ epoch.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ worker.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    x
}

/// Per-sample stochastic gradient descent over one network.
///
/// Owns every buffer one update needs (forward state, per-layer deltas,
/// momentum velocities, row/target scratch) so the inner loop allocates
/// nothing. One kernel belongs to exactly one execution unit; replicas each
/// build their own.
pub(crate) struct SgdKernel {
    state: ForwardState,
    deltas: Vec<Array1<f32>>,
    vel_w: Vec<Array2<f32>>,
    vel_b: Vec<Array1<f32>>,
    features: Vec<f32>,
    target: Array1<f32>,
    rng: StdRng,
}

impl SgdKernel {
    pub fn new(net: &NeuralNet, seed: u64) -> Self {
        let deltas = net
            .layers()
            .iter()
            .map(|l| Array1::zeros(l.out_units()))
            .collect();
        let vel_w = net
            .layers()
            .iter()
            .map(|l| Array2::zeros((l.out_units(), l.in_units())))
            .collect();
        let vel_b = net
            .layers()
            .iter()
            .map(|l| Array1::zeros(l.out_units()))
            .collect();

        Self {
            state: ForwardState::new(net),
            deltas,
            vel_w,
            vel_b,
            features: vec![0.0; net.inputs()],
            target: Array1::zeros(net.outputs()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Trains the network on one row and returns the per-sample loss.
    ///
    /// `samples_seen` is the schedule position: it selects the annealed rate
    /// and the ramped momentum for this update.
    pub fn train_row(
        &mut self,
        net: &mut NeuralNet,
        frame: &Frame,
        layout: &FeatureLayout,
        row: usize,
        params: &HyperParameters,
        samples_seen: u64,
    ) -> f32 {
        layout.fill_row(frame, row, &mut self.features);
        self.state.load_input(&self.features);

        // Input dropout, training-time only. Inverted scaling keeps the
        // expected input magnitude unchanged, so inference needs no rescale.
        let dropout = params.input_dropout_ratio;
        if params.activation.uses_input_dropout() && dropout > 0.0 {
            let keep = 1.0 - dropout;
            for x in self.state.input_mut() {
                if self.rng.random::<f32>() < dropout {
                    *x = 0.0;
                } else {
                    *x /= keep;
                }
            }
        }

        net.forward(&mut self.state);

        self.target.fill(0.0);
        let response = layout.response_value(frame, row);
        if net.is_classification() {
            let class = response as usize;
            debug_assert!(class < net.outputs(), "label outside class domain");
            if class < net.outputs() {
                self.target[class] = 1.0;
            }
        } else {
            self.target[0] = response;
        }

        let loss = params.loss.loss(self.state.output(), self.target.view());

        self.backward(net);
        self.update(net, params, samples_seen);

        loss
    }

    /// Backward sweep: fills `deltas[l] = dL/dz_l` for every layer, reading
    /// the pre-update weights.
    fn backward(&mut self, net: &NeuralNet) {
        let state = &self.state;
        let deltas = &mut self.deltas;
        let layers = net.layers();
        let last = layers.len() - 1;

        {
            let out_delta = deltas[last].as_slice_mut().expect("contiguous delta");
            // Softmax + cross-entropy and linear + squared error share the
            // same output error signal.
            for ((d, &p), &t) in out_delta
                .iter_mut()
                .zip(state.output().iter())
                .zip(self.target.iter())
            {
                *d = p - t;
            }
        }

        let act = net.activation();
        for l in (0..last).rev() {
            let (head, tail) = deltas.split_at_mut(l + 1);
            let cur = &mut head[l];
            let next = &tail[0];

            let w_next_t = layers[l + 1].weights().t();
            general_mat_vec_mul(1.0, &w_next_t, next, 0.0, cur);

            let z = state.z(l);
            cur.zip_mut_with(&z, |d, &zv| *d *= act.df(zv));
        }
    }

    /// Applies the momentum update with L1/L2 penalties and the per-unit
    /// incoming-weight norm cap.
    fn update(&mut self, net: &mut NeuralNet, params: &HyperParameters, samples_seen: u64) {
        let lr = schedule::effective_rate(params, samples_seen);
        let mu = schedule::effective_momentum(params, samples_seen);
        let (l1, l2, max_w2) = (params.l1, params.l2, params.max_w2);

        let state = &self.state;
        let deltas = &self.deltas;
        let vel_w = &mut self.vel_w;
        let vel_b = &mut self.vel_b;

        for (l, layer) in net.layers_mut().iter_mut().enumerate() {
            let a_prev = state.activation(l);
            let a_prev = a_prev.as_slice().expect("contiguous activation");
            let delta = deltas[l].as_slice().expect("contiguous delta");

            let bias = layer.bias_mut();
            let vb = vel_b[l].as_slice_mut().expect("contiguous velocity");
            for (i, &d) in delta.iter().enumerate() {
                vb[i] = mu * vb[i] + d;
                bias[i] -= lr * vb[i];
            }

            let weights = layer.weights_mut();
            for (i, &d) in delta.iter().enumerate() {
                let mut w_row = weights.row_mut(i);
                let w_row = w_row.as_slice_mut().expect("contiguous weight row");
                let mut v_row = vel_w[l].row_mut(i);
                let v_row = v_row.as_slice_mut().expect("contiguous velocity row");

                for ((w, v), &a) in w_row.iter_mut().zip(v_row.iter_mut()).zip(a_prev) {
                    let sign = if *w > 0.0 {
                        1.0
                    } else if *w < 0.0 {
                        -1.0
                    } else {
                        0.0
                    };
                    let g = d * a + l2 * *w + l1 * sign;
                    *v = mu * *v + g;
                    *w -= lr * *v;
                }

                if max_w2.is_finite() {
                    cap_squared_norm(w_row, max_w2);
                }
            }
        }
    }
}

/// Rescales `w` so its squared L2 norm never exceeds `max_w2`.
fn cap_squared_norm(w: &mut [f32], max_w2: f32) {
    let norm2: f32 = w.iter().map(|x| x * x).sum();
    if norm2 > max_w2 {
        let scale = (max_w2 / norm2).sqrt();
        w.iter_mut().for_each(|x| *x *= scale);
    }
}
