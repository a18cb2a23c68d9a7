#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
#![deny(missing_docs, unused_must_use)]

//! Activation functions as a pluggable capability.
//!
//! An activation evaluates a pre-activation sum, reports its derivative at the
//! same point, and serializes itself under a type tag. Layers hold activations
//! as `Arc<dyn Activation>` and restore them through an [`ActivationRegistry`].

use std::fmt;

/// Stock activation implementations.
pub mod functions;
/// Tag → deserializer lookup.
pub mod registry;

pub use functions::{HyperbolicTangent, Identity, LeakyReLU, ReLU, Sigmoid};
pub use registry::{ActivationRegistry, DeserializeFn};

/// Errors raised while reconstructing an activation from its persisted form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    /// No deserializer is registered for this tag
    #[error("unknown activation type: {0:?}")]
    UnknownType(String),
    /// The payload could not be decoded by the tag's deserializer
    #[error("malformed payload for activation {tag:?}: {reason}")]
    MalformedPayload {
        /// tag of the activation being decoded
        tag: String,
        /// what was wrong with the payload
        reason: String,
    },
}

/// A differentiable scalar function applied after a layer's weighted sum.
///
/// `deriv(x)` must be the true derivative of `eval` at `x`; backpropagation
/// composes the two through the chain rule without checking.
pub trait Activation: fmt::Debug + Send + Sync {
    /// Evaluate the function at a pre-activation value.
    fn eval(&self, x: f64) -> f64;

    /// Derivative of [`Activation::eval`] at the same pre-activation value.
    fn deriv(&self, x: f64) -> f64;

    /// Opaque payload understood by the deserializer registered for
    /// [`Activation::serializer_type`].
    fn serialize(&self) -> Vec<u8>;

    /// Tag identifying which deserializer restores this activation.
    fn serializer_type(&self) -> &'static str;
}
