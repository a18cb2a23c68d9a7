use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::functions::{HyperbolicTangent, Identity, LeakyReLU, ReLU, Sigmoid};
use crate::{Activation, ActivationError};

/// Rebuilds an activation from its serialized payload.
pub type DeserializeFn = fn(&[u8]) -> Result<Arc<dyn Activation>, ActivationError>;

/// Maps activation type tags to their deserializers.
///
/// `ActivationRegistry::default()` knows every stock activation; `new()` starts
/// empty for callers that want to restrict what may be loaded.
#[derive(Clone)]
pub struct ActivationRegistry {
    deserializers: HashMap<String, DeserializeFn>,
}

impl ActivationRegistry {
    /// Registry with no entries.
    pub fn new() -> Self {
        Self {
            deserializers: HashMap::new(),
        }
    }

    /// Add or replace the deserializer for `tag`.
    pub fn register(&mut self, tag: &str, deserialize: DeserializeFn) -> &mut Self {
        self.deserializers.insert(tag.to_string(), deserialize);
        self
    }

    /// Whether a deserializer exists for `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.deserializers.contains_key(tag)
    }

    /// Reconstruct the activation persisted under `tag`.
    pub fn deserialize(
        &self,
        tag: &str,
        payload: &[u8],
    ) -> Result<Arc<dyn Activation>, ActivationError> {
        let deserialize = self
            .deserializers
            .get(tag)
            .ok_or_else(|| ActivationError::UnknownType(tag.to_string()))?;
        deserialize(payload)
    }
}

impl Default for ActivationRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(Identity::TAG, Identity::deserialize)
            .register(Sigmoid::TAG, Sigmoid::deserialize)
            .register(ReLU::TAG, ReLU::deserialize)
            .register(HyperbolicTangent::TAG, HyperbolicTangent::deserialize)
            .register(LeakyReLU::TAG, LeakyReLU::deserialize);
        registry
    }
}

impl fmt::Debug for ActivationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.deserializers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ActivationRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Softplus;

    impl Activation for Softplus {
        fn eval(&self, x: f64) -> f64 {
            x.exp().ln_1p()
        }
        fn deriv(&self, x: f64) -> f64 {
            1.0 / (1.0 + (-x).exp())
        }
        fn serialize(&self) -> Vec<u8> {
            Vec::new()
        }
        fn serializer_type(&self) -> &'static str {
            "softplus"
        }
    }

    #[test]
    fn stock_activations_round_trip() {
        let registry = ActivationRegistry::default();
        let stock: Vec<Arc<dyn Activation>> = vec![
            Arc::new(Identity) as Arc<dyn Activation>,
            Arc::new(Sigmoid) as Arc<dyn Activation>,
            Arc::new(ReLU) as Arc<dyn Activation>,
            Arc::new(HyperbolicTangent) as Arc<dyn Activation>,
            Arc::new(LeakyReLU { slope: 0.3 }) as Arc<dyn Activation>,
        ];
        for act in stock {
            let restored = registry
                .deserialize(act.serializer_type(), &act.serialize())
                .unwrap();
            assert_eq!(restored.serializer_type(), act.serializer_type());
            for x in [-2.0, -0.5, 0.0, 0.5, 2.0] {
                assert_eq!(restored.eval(x), act.eval(x));
                assert_eq!(restored.deriv(x), act.deriv(x));
            }
        }
    }

    #[test]
    fn unknown_tag_fails() {
        let registry = ActivationRegistry::default();
        assert_eq!(
            registry.deserialize("softplus", &[]).unwrap_err(),
            ActivationError::UnknownType("softplus".to_string())
        );
        assert!(!ActivationRegistry::new().contains(Sigmoid::TAG));
    }

    #[test]
    fn custom_activation_can_be_registered() {
        let mut registry = ActivationRegistry::default();
        registry.register("softplus", |_| Ok(Arc::new(Softplus)));
        assert!(registry.contains("softplus"));
        let act = registry.deserialize("softplus", &[]).unwrap();
        assert!((act.eval(0.0) - 2f64.ln()).abs() < 1e-12);
    }
}
