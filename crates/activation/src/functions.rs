use std::sync::Arc;

use crate::{Activation, ActivationError};

fn expect_empty(tag: &str, payload: &[u8]) -> Result<(), ActivationError> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(ActivationError::MalformedPayload {
            tag: tag.to_string(),
            reason: format!("expected no payload, got {} bytes", payload.len()),
        })
    }
}

/// f(x) = x
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Identity;

impl Identity {
    /// Type tag used in persisted layers.
    pub const TAG: &'static str = "identity";

    /// Restore from a (necessarily empty) payload.
    pub fn deserialize(payload: &[u8]) -> Result<Arc<dyn Activation>, ActivationError> {
        expect_empty(Self::TAG, payload)?;
        Ok(Arc::new(Identity))
    }
}

impl Activation for Identity {
    fn eval(&self, x: f64) -> f64 {
        x
    }

    fn deriv(&self, _x: f64) -> f64 {
        1.0
    }

    fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }

    fn serializer_type(&self) -> &'static str {
        Self::TAG
    }
}

/// Logistic function, f(x) = 1 / (1 + e^-x)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sigmoid;

impl Sigmoid {
    /// Type tag used in persisted layers.
    pub const TAG: &'static str = "sigmoid";

    /// Restore from a (necessarily empty) payload.
    pub fn deserialize(payload: &[u8]) -> Result<Arc<dyn Activation>, ActivationError> {
        expect_empty(Self::TAG, payload)?;
        Ok(Arc::new(Sigmoid))
    }
}

impl Activation for Sigmoid {
    fn eval(&self, x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    fn deriv(&self, x: f64) -> f64 {
        let s = self.eval(x);
        s * (1.0 - s)
    }

    fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }

    fn serializer_type(&self) -> &'static str {
        Self::TAG
    }
}

/// Rectified linear unit, f(x) = max(0, x)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReLU;

impl ReLU {
    /// Type tag used in persisted layers.
    pub const TAG: &'static str = "relu";

    /// Restore from a (necessarily empty) payload.
    pub fn deserialize(payload: &[u8]) -> Result<Arc<dyn Activation>, ActivationError> {
        expect_empty(Self::TAG, payload)?;
        Ok(Arc::new(ReLU))
    }
}

impl Activation for ReLU {
    fn eval(&self, x: f64) -> f64 {
        x.max(0.0)
    }

    fn deriv(&self, x: f64) -> f64 {
        if x > 0.0 {
            1.0
        } else {
            0.0
        }
    }

    fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }

    fn serializer_type(&self) -> &'static str {
        Self::TAG
    }
}

/// f(x) = tanh(x)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HyperbolicTangent;

impl HyperbolicTangent {
    /// Type tag used in persisted layers.
    pub const TAG: &'static str = "hyperbolictangent";

    /// Restore from a (necessarily empty) payload.
    pub fn deserialize(payload: &[u8]) -> Result<Arc<dyn Activation>, ActivationError> {
        expect_empty(Self::TAG, payload)?;
        Ok(Arc::new(HyperbolicTangent))
    }
}

impl Activation for HyperbolicTangent {
    fn eval(&self, x: f64) -> f64 {
        x.tanh()
    }

    fn deriv(&self, x: f64) -> f64 {
        let t = x.tanh();
        1.0 - t * t
    }

    fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }

    fn serializer_type(&self) -> &'static str {
        Self::TAG
    }
}

/// ReLU with a small slope for negative inputs.
///
/// The slope is the only parameterized state among the stock activations and is
/// persisted as 8 little-endian bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeakyReLU {
    /// multiplier applied to negative inputs
    pub slope: f64,
}

impl Default for LeakyReLU {
    fn default() -> Self {
        Self { slope: 0.01 }
    }
}

impl LeakyReLU {
    /// Type tag used in persisted layers.
    pub const TAG: &'static str = "leakyrelu";

    /// Restore from an 8-byte little-endian slope.
    pub fn deserialize(payload: &[u8]) -> Result<Arc<dyn Activation>, ActivationError> {
        let bytes = <[u8; 8]>::try_from(payload).map_err(|_| ActivationError::MalformedPayload {
            tag: Self::TAG.to_string(),
            reason: format!("expected 8 bytes, got {}", payload.len()),
        })?;
        let slope = f64::from_le_bytes(bytes);
        if !slope.is_finite() {
            return Err(ActivationError::MalformedPayload {
                tag: Self::TAG.to_string(),
                reason: format!("slope must be finite, got {slope}"),
            });
        }
        Ok(Arc::new(LeakyReLU { slope }))
    }
}

impl Activation for LeakyReLU {
    fn eval(&self, x: f64) -> f64 {
        if x > 0.0 {
            x
        } else {
            self.slope * x
        }
    }

    fn deriv(&self, x: f64) -> f64 {
        if x > 0.0 {
            1.0
        } else {
            self.slope
        }
    }

    fn serialize(&self) -> Vec<u8> {
        self.slope.to_le_bytes().to_vec()
    }

    fn serializer_type(&self) -> &'static str {
        Self::TAG
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numeric_deriv(f: &dyn Activation, x: f64) -> f64 {
        let h = 1e-6;
        (f.eval(x + h) - f.eval(x - h)) / (2.0 * h)
    }

    fn smooth() -> Vec<Arc<dyn Activation>> {
        vec![
            Arc::new(Identity) as Arc<dyn Activation>,
            Arc::new(Sigmoid) as Arc<dyn Activation>,
            Arc::new(HyperbolicTangent) as Arc<dyn Activation>,
        ]
    }

    #[test]
    fn known_values() {
        assert_eq!(Identity.eval(-3.5), -3.5);
        assert_eq!(Sigmoid.eval(0.0), 0.5);
        assert_eq!(Sigmoid.deriv(0.0), 0.25);
        assert_eq!(ReLU.eval(-2.0), 0.0);
        assert_eq!(ReLU.eval(2.0), 2.0);
        assert_eq!(HyperbolicTangent.deriv(0.0), 1.0);
        let leaky = LeakyReLU { slope: 0.1 };
        assert_eq!(leaky.eval(-2.0), -0.2);
        assert_eq!(leaky.deriv(-2.0), 0.1);
        assert_eq!(leaky.deriv(2.0), 1.0);
    }

    #[test]
    fn leaky_slope_payload() {
        let leaky = LeakyReLU { slope: 0.25 };
        let restored = LeakyReLU::deserialize(&leaky.serialize()).unwrap();
        assert_eq!(restored.eval(-4.0), -1.0);
        assert!(matches!(
            LeakyReLU::deserialize(&[1, 2, 3]),
            Err(ActivationError::MalformedPayload { .. })
        ));
        assert!(LeakyReLU::deserialize(&f64::NAN.to_le_bytes()).is_err());
    }

    #[test]
    fn payload_free_activations_reject_bytes() {
        let err = Sigmoid::deserialize(&[0]).unwrap_err();
        assert_eq!(
            err,
            ActivationError::MalformedPayload {
                tag: "sigmoid".to_string(),
                reason: "expected no payload, got 1 bytes".to_string(),
            }
        );
    }

    proptest! {
        #[test]
        fn derivatives_match_finite_differences(x in -6.0f64..6.0) {
            for f in smooth() {
                let analytic = f.deriv(x);
                let numeric = numeric_deriv(f.as_ref(), x);
                prop_assert!((analytic - numeric).abs() < 1e-6, "{:?} at {}", f, x);
            }
        }

        #[test]
        fn piecewise_derivatives_away_from_kink(x in prop_oneof![-6.0f64..-0.01, 0.01f64..6.0]) {
            let pieces: [&dyn Activation; 2] = [&ReLU, &LeakyReLU::default()];
            for f in pieces {
                prop_assert!((f.deriv(x) - numeric_deriv(f, x)).abs() < 1e-6);
            }
        }
    }
}
