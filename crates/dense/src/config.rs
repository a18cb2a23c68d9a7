#![forbid(unsafe_code)]

use std::sync::Arc;

use activation::{Activation, ActivationRegistry};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layer::DenseLayer;

/// Parameters for a dense layer.
#[derive(Clone, Debug)]
pub struct DenseParams {
    /// activation applied to every neuron
    pub activation: Arc<dyn Activation>,
    /// number of input features
    pub input_count: usize,
    /// number of output neurons
    pub output_count: usize,
}

impl DenseParams {
    /// Create a zeroed layer; equivalent to [`DenseLayer::new`].
    pub fn make(&self) -> DenseLayer {
        DenseLayer::new(self.input_count, self.output_count, Arc::clone(&self.activation))
    }
}

/// Declarative layer description, e.g. loaded from a JSON file.
///
/// ```
/// let cfg = dense::LayerConfig::from_json(
///     r#"{"input_count": 3, "output_count": 2, "activation": "sigmoid", "seed": 7}"#,
/// ).unwrap();
/// let layer = cfg.build(&activation::ActivationRegistry::default()).unwrap();
/// assert_eq!(layer.weights().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// number of input features
    pub input_count: usize,
    /// number of output neurons
    pub output_count: usize,
    /// activation type tag
    pub activation: String,
    /// payload handed to the activation's deserializer
    #[serde(default)]
    pub activation_payload: Vec<u8>,
    /// seed for reproducible initialization; the thread RNG is used when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LayerConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build and randomize the described layer.
    pub fn build(&self, registry: &ActivationRegistry) -> Result<DenseLayer, ConfigError> {
        let activation = registry.deserialize(&self.activation, &self.activation_payload)?;
        let mut layer = DenseParams {
            activation,
            input_count: self.input_count,
            output_count: self.output_count,
        }
        .make();
        match self.seed {
            Some(seed) => layer.randomize_seeded(seed),
            None => layer.randomize(),
        }
        Ok(layer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use activation::{ActivationError, LeakyReLU, Sigmoid};

    #[test]
    fn params_make_zeroed_layer() {
        let layer = DenseParams {
            activation: Arc::new(Sigmoid),
            input_count: 3,
            output_count: 2,
        }
        .make();
        assert_eq!(layer.weights(), &[vec![0.0; 3], vec![0.0; 3]]);
        assert_eq!(layer.biases(), &[0.0, 0.0]);
    }

    #[test]
    fn seeded_config_is_reproducible() {
        let text = r#"{"input_count": 4, "output_count": 3, "activation": "relu", "seed": 42}"#;
        let cfg = LayerConfig::from_json(text).unwrap();
        assert_eq!(cfg.activation_payload, Vec::<u8>::new());
        let registry = ActivationRegistry::default();
        let a = cfg.build(&registry).unwrap();
        let b = cfg.build(&registry).unwrap();
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.biases(), b.biases());
        assert_eq!(a.activation().serializer_type(), "relu");
    }

    #[test]
    fn payload_reaches_activation() {
        let cfg = LayerConfig {
            input_count: 1,
            output_count: 1,
            activation: LeakyReLU::TAG.to_string(),
            activation_payload: Activation::serialize(&LeakyReLU { slope: 0.2 }),
            seed: None,
        };
        let layer = cfg.build(&ActivationRegistry::default()).unwrap();
        assert_eq!(layer.activation().deriv(-1.0), 0.2);
    }

    #[test]
    fn bad_configs_fail() {
        assert!(matches!(
            LayerConfig::from_json(r#"{"input_count": 1, "output_count": 1}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LayerConfig::from_json(
                r#"{"input_count": 1, "output_count": 1, "activation": "relu", "lr": 0.1}"#
            ),
            Err(ConfigError::Parse(_))
        ));
        let text = r#"{"input_count": 1, "output_count": 1, "activation": "swish"}"#;
        let cfg = LayerConfig::from_json(text).unwrap();
        assert!(matches!(
            cfg.build(&ActivationRegistry::default()),
            Err(ConfigError::Activation(ActivationError::UnknownType(_)))
        ));
    }
}
