#![forbid(unsafe_code)]

use std::sync::Arc;

use activation::Activation;
use rand::distributions::Distribution;
use rand::Rng;

use crate::error::LayerError;
use crate::rng::{make_rng, symmetric_uniform};

/// Fully-connected layer: `output[i] = act(sum_j weights[i][j] * input[j] + biases[i])`.
///
/// The layer caches everything one forward/backward cycle produces. It is driven
/// sequentially: set the input, propagate forward, set the downstream gradient,
/// propagate backward, then step. Give each concurrent worker its own clone.
#[derive(Clone, Debug)]
pub struct DenseLayer {
    activation: Arc<dyn Activation>,
    input_count: usize,

    // one row and one bias per output neuron
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,

    output: Vec<f64>,
    output_sums: Vec<f64>,

    downstream_gradient: Option<Vec<f64>>,
    weight_gradient: Vec<Vec<f64>>,
    bias_gradient: Vec<f64>,

    upstream_gradient: Vec<f64>,
    input: Option<Vec<f64>>,

    // output_sums were computed from the current input and parameters
    forward_current: bool,
}

// zero-filled buffer, or None if `len` floats cannot be allocated
fn zeroed(len: usize) -> Option<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, 0.0);
    Some(buf)
}

impl DenseLayer {
    /// Create a layer with zero weights and biases. Call [`DenseLayer::randomize`]
    /// before training.
    pub fn new(input_count: usize, output_count: usize, activation: Arc<dyn Activation>) -> Self {
        tracing::trace!(
            input_count,
            output_count,
            activation = activation.serializer_type(),
            "new dense layer"
        );
        Self {
            activation,
            input_count,
            weights: vec![vec![0.0; input_count]; output_count],
            biases: vec![0.0; output_count],
            output: vec![0.0; output_count],
            output_sums: vec![0.0; output_count],
            downstream_gradient: None,
            weight_gradient: vec![vec![0.0; input_count]; output_count],
            bias_gradient: vec![0.0; output_count],
            upstream_gradient: vec![0.0; input_count],
            input: None,
            forward_current: false,
        }
    }

    /// Create a layer from explicit parameters.
    ///
    /// `weights` holds one row of `input_count` coefficients per output neuron and
    /// `biases` one value per row. Caches start zeroed.
    pub fn from_parameters(
        input_count: usize,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
        activation: Arc<dyn Activation>,
    ) -> Result<Self, LayerError> {
        if biases.len() != weights.len() {
            return Err(LayerError::ShapeMismatch {
                what: "biases",
                expected: weights.len(),
                actual: biases.len(),
            });
        }
        if let Some(row) = weights.iter().find(|row| row.len() != input_count) {
            return Err(LayerError::ShapeMismatch {
                what: "weight row",
                expected: input_count,
                actual: row.len(),
            });
        }
        // input_count may come from an untrusted record when there are no rows
        let upstream_gradient = zeroed(input_count).ok_or(LayerError::Allocation {
            what: "upstream gradient",
            len: input_count,
        })?;
        let output_count = weights.len();
        let weight_gradient = weights.iter().map(|row| vec![0.0; row.len()]).collect();
        Ok(Self {
            activation,
            input_count,
            weights,
            biases,
            output: vec![0.0; output_count],
            output_sums: vec![0.0; output_count],
            downstream_gradient: None,
            weight_gradient,
            bias_gradient: vec![0.0; output_count],
            upstream_gradient,
            input: None,
            forward_current: false,
        })
    }

    /// Number of input features.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Number of output neurons.
    pub fn output_count(&self) -> usize {
        self.biases.len()
    }

    /// The activation applied to every weighted sum.
    pub fn activation(&self) -> &Arc<dyn Activation> {
        &self.activation
    }

    /// Weight rows, one per output neuron.
    /// The caller should not rely on this view staying unchanged across updates.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Biases, one per output neuron.
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Randomize weights and biases from the thread RNG.
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    /// Randomize reproducibly from a ChaCha stream seeded with `seed`.
    pub fn randomize_seeded(&mut self, seed: u64) {
        tracing::debug!(seed, "randomizing dense layer");
        self.randomize_with(&mut make_rng(seed));
    }

    /// Randomize weights and biases from `rng`.
    ///
    /// Biases are uniform with variance 1, i.e. in `[-sqrt(3), sqrt(3)]`. Weights are
    /// uniform in `[-sqrt(3/n), sqrt(3/n)]` for `n` inputs, so a weighted sum of
    /// unit-variance inputs also has variance 1.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Some(dist) = symmetric_uniform(3f64.sqrt()) {
            for bias in &mut self.biases {
                *bias = dist.sample(rng);
            }
        }
        if let Some(dist) = symmetric_uniform((3.0 / self.input_count as f64).sqrt()) {
            for weight in self.weights.iter_mut().flatten() {
                *weight = dist.sample(rng);
            }
        }
        self.forward_current = false;
    }

    /// The most recently set input, if any.
    pub fn input(&self) -> Option<&[f64]> {
        self.input.as_deref()
    }

    /// Store a copy of `input` for the next forward pass.
    ///
    /// Fails without touching the layer if the length is not `input_count`.
    pub fn set_input(&mut self, input: &[f64]) -> Result<(), LayerError> {
        if input.len() != self.input_count {
            return Err(LayerError::ShapeMismatch {
                what: "input",
                expected: self.input_count,
                actual: input.len(),
            });
        }
        let buf = self.input.get_or_insert_with(Vec::new);
        buf.clear();
        buf.extend_from_slice(input);
        self.forward_current = false;
        Ok(())
    }

    /// Compute `output_sums` and `output` from the current input.
    pub fn propagate_forward(&mut self) -> Result<(), LayerError> {
        let input = self.input.as_deref().ok_or(LayerError::MissingInput)?;
        let rows = self.weights.iter().zip(&self.biases);
        let slots = self.output_sums.iter_mut().zip(self.output.iter_mut());
        for ((weights, bias), (sum_slot, out_slot)) in rows.zip(slots) {
            let mut sum = kahan::dot(weights, input);
            sum.add(*bias);
            let total = sum.total();
            *sum_slot = total;
            *out_slot = self.activation.eval(total);
        }
        self.forward_current = true;
        Ok(())
    }

    /// Post-activation values from the last forward pass.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Pre-activation sums from the last forward pass.
    pub fn output_sums(&self) -> &[f64] {
        &self.output_sums
    }

    /// The most recently set downstream gradient, if any.
    pub fn downstream_gradient(&self) -> Option<&[f64]> {
        self.downstream_gradient.as_deref()
    }

    /// Store a copy of the loss gradient with respect to this layer's output.
    ///
    /// Fails without touching the layer if the length is not `output_count`.
    pub fn set_downstream_gradient(&mut self, gradient: &[f64]) -> Result<(), LayerError> {
        if gradient.len() != self.output.len() {
            return Err(LayerError::ShapeMismatch {
                what: "downstream gradient",
                expected: self.output.len(),
                actual: gradient.len(),
            });
        }
        let buf = self.downstream_gradient.get_or_insert_with(Vec::new);
        buf.clear();
        buf.extend_from_slice(gradient);
        Ok(())
    }

    /// Compute the weight and bias gradients, and the upstream gradient when
    /// `compute_upstream` is set.
    ///
    /// Requires a forward pass since the last input or parameter change. The first
    /// layer of a network can pass `false` since nothing consumes its upstream gradient.
    pub fn propagate_backward(&mut self, compute_upstream: bool) -> Result<(), LayerError> {
        if !self.forward_current {
            return Err(LayerError::StaleForward);
        }
        let downstream = self
            .downstream_gradient
            .as_deref()
            .ok_or(LayerError::MissingDownstreamGradient)?;
        let input = self.input.as_deref().ok_or(LayerError::MissingInput)?;

        if compute_upstream {
            self.upstream_gradient.fill(0.0);
        }

        let neurons = self.weights.iter().zip(&self.output_sums).zip(downstream);
        let grads = self.bias_gradient.iter_mut().zip(self.weight_gradient.iter_mut());
        for (((weights, &sum), &down), (bias_grad, weight_grads)) in neurons.zip(grads) {
            let delta = down * self.activation.deriv(sum);
            *bias_grad = delta;
            for (grad, &x) in weight_grads.iter_mut().zip(input) {
                *grad = x * delta;
            }
            if compute_upstream {
                for (up, &w) in self.upstream_gradient.iter_mut().zip(weights) {
                    *up += delta * w;
                }
            }
        }
        Ok(())
    }

    /// Loss gradient with respect to the input, from the last backward pass that
    /// computed it.
    pub fn upstream_gradient(&self) -> &[f64] {
        &self.upstream_gradient
    }

    /// Loss gradient with respect to each weight, shaped like [`DenseLayer::weights`].
    pub fn weight_gradient(&self) -> &[Vec<f64>] {
        &self.weight_gradient
    }

    /// Loss gradient with respect to each bias.
    pub fn bias_gradient(&self) -> &[f64] {
        &self.bias_gradient
    }

    /// Squared Euclidean norm of the full parameter gradient.
    pub fn gradient_mag_squared(&self) -> f64 {
        let grads = self.bias_gradient.iter().chain(self.weight_gradient.iter().flatten());
        kahan::sum_squares(grads.copied())
    }

    /// Add `gradient * factor` to every parameter.
    ///
    /// No clipping or normalization happens here; pass a negative learning rate
    /// for plain gradient descent.
    pub fn step_gradient(&mut self, factor: f64) {
        for (bias, grad) in self.biases.iter_mut().zip(&self.bias_gradient) {
            *bias += grad * factor;
        }
        for (weights, grads) in self.weights.iter_mut().zip(&self.weight_gradient) {
            for (weight, grad) in weights.iter_mut().zip(grads) {
                *weight += grad * factor;
            }
        }
        self.forward_current = false;
    }
}
