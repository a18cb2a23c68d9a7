#![forbid(unsafe_code)]

use crate::error::{EncodeError, LayerError};
use crate::layer::DenseLayer;

/// The surface a network or training loop drives on each of its layers.
///
/// A network chains layers by handing each layer's `output` to the next one's
/// `set_input`, and each `upstream_gradient` to the previous one's
/// `set_downstream_gradient`.
pub trait Layer {
    /// Reinitialize the parameters randomly.
    fn randomize(&mut self);
    /// Store the input for the next forward pass.
    fn set_input(&mut self, input: &[f64]) -> Result<(), LayerError>;
    /// The current input, if one was set.
    fn input(&self) -> Option<&[f64]>;
    /// Compute the output from the current input.
    fn propagate_forward(&mut self) -> Result<(), LayerError>;
    /// Output of the last forward pass.
    fn output(&self) -> &[f64];
    /// Store the loss gradient with respect to the output.
    fn set_downstream_gradient(&mut self, gradient: &[f64]) -> Result<(), LayerError>;
    /// The current downstream gradient, if one was set.
    fn downstream_gradient(&self) -> Option<&[f64]>;
    /// Compute parameter gradients, and the upstream gradient if requested.
    fn propagate_backward(&mut self, compute_upstream: bool) -> Result<(), LayerError>;
    /// Loss gradient with respect to the input.
    fn upstream_gradient(&self) -> &[f64];
    /// Squared norm of the parameter gradient.
    fn gradient_mag_squared(&self) -> f64;
    /// Add `gradient * factor` to the parameters.
    fn step_gradient(&mut self, factor: f64);
    /// Persist the layer.
    fn serialize(&self) -> Result<Vec<u8>, EncodeError>;
    /// Tag identifying the layer kind in persisted form.
    fn serializer_type(&self) -> &'static str;
}

impl Layer for DenseLayer {
    fn randomize(&mut self) {
        DenseLayer::randomize(self)
    }

    fn set_input(&mut self, input: &[f64]) -> Result<(), LayerError> {
        DenseLayer::set_input(self, input)
    }

    fn input(&self) -> Option<&[f64]> {
        DenseLayer::input(self)
    }

    fn propagate_forward(&mut self) -> Result<(), LayerError> {
        DenseLayer::propagate_forward(self)
    }

    fn output(&self) -> &[f64] {
        DenseLayer::output(self)
    }

    fn set_downstream_gradient(&mut self, gradient: &[f64]) -> Result<(), LayerError> {
        DenseLayer::set_downstream_gradient(self, gradient)
    }

    fn downstream_gradient(&self) -> Option<&[f64]> {
        DenseLayer::downstream_gradient(self)
    }

    fn propagate_backward(&mut self, compute_upstream: bool) -> Result<(), LayerError> {
        DenseLayer::propagate_backward(self, compute_upstream)
    }

    fn upstream_gradient(&self) -> &[f64] {
        DenseLayer::upstream_gradient(self)
    }

    fn gradient_mag_squared(&self) -> f64 {
        DenseLayer::gradient_mag_squared(self)
    }

    fn step_gradient(&mut self, factor: f64) {
        DenseLayer::step_gradient(self, factor)
    }

    fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        DenseLayer::serialize(self)
    }

    fn serializer_type(&self) -> &'static str {
        DenseLayer::serializer_type(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use activation::{HyperbolicTangent, Identity};

    // one SGD step through every layer, using only the trait; returns the squared-error loss
    fn train_step(layers: &mut [Box<dyn Layer>], input: &[f64], target: &[f64], rate: f64) -> f64 {
        let mut signal = input.to_vec();
        for layer in layers.iter_mut() {
            layer.set_input(&signal).unwrap();
            layer.propagate_forward().unwrap();
            signal = layer.output().to_vec();
        }
        let mut gradient: Vec<f64> = signal.iter().zip(target).map(|(y, t)| y - t).collect();
        let loss: f64 = gradient.iter().map(|g| 0.5 * g * g).sum();
        for (idx, layer) in layers.iter_mut().enumerate().rev() {
            layer.set_downstream_gradient(&gradient).unwrap();
            layer.propagate_backward(idx > 0).unwrap();
            gradient = layer.upstream_gradient().to_vec();
            layer.step_gradient(-rate);
        }
        loss
    }

    #[test]
    fn chained_layers_learn_a_linear_map() {
        let mut hidden = DenseLayer::new(2, 4, Arc::new(HyperbolicTangent));
        let mut out = DenseLayer::new(4, 1, Arc::new(Identity));
        hidden.randomize_seeded(1);
        out.randomize_seeded(2);
        let mut layers: Vec<Box<dyn Layer>> = vec![Box::new(hidden), Box::new(out)];
        assert!(layers.iter().all(|l| l.serializer_type() == "denselayer"));

        let inputs = [[0.1, 0.2], [-0.3, 0.4], [0.5, -0.2], [-0.2, -0.3]];
        let epoch = |layers: &mut [Box<dyn Layer>]| -> f64 {
            inputs
                .iter()
                .map(|x| train_step(layers, x, &[0.5 * x[0] - 0.25 * x[1]], 0.05))
                .sum()
        };
        let first = epoch(layers.as_mut_slice());
        let mut last = first;
        for _ in 0..500 {
            last = epoch(layers.as_mut_slice());
        }
        assert!(last < first, "first={first} last={last}");
        assert!(last < 0.1, "last={last}");
    }
}
