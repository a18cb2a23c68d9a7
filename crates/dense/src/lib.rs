#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
#![deny(missing_docs, unused_must_use)]

//! Dense: a fully-connected layer with hand-derived gradients
//!
//! This crate is the numerical core of a small neural-network toolkit: one dense
//! layer computing `act(W x + b)` for a single input vector, the matching backward
//! pass, a raw gradient step, and a persisted form that round-trips a trained layer
//! exactly. Network assembly and training loops live with the caller, who drives
//! each layer through the [`Layer`] trait.
//!
//! Layout (important files):
//! - `layer.rs` — `DenseLayer`: forward/backward propagation, gradient step, accessors
//! - `codec.rs` — JSON/bincode records with explicit dimensions and type tags
//! - `config.rs` — `DenseParams` and the serde-loadable `LayerConfig`
//! - `traits.rs` — the `Layer` trait a network drives
//! - `rng.rs` — seeded ChaCha RNG and the symmetric uniform initializer
//! - `error.rs` — `LayerError`, `DecodeError`, `EncodeError`, `ConfigError`
//!
//! ```
//! use std::sync::Arc;
//! use dense::DenseLayer;
//! use activation::Identity;
//!
//! let weights = vec![vec![1.0, -1.0]];
//! let mut layer = DenseLayer::from_parameters(2, weights, vec![0.5], Arc::new(Identity)).unwrap();
//! layer.set_input(&[3.0, 1.0]).unwrap();
//! layer.propagate_forward().unwrap();
//! assert_eq!(layer.output(), &[2.5]);
//!
//! layer.set_downstream_gradient(&[2.0]).unwrap();
//! layer.propagate_backward(true).unwrap();
//! assert_eq!(layer.upstream_gradient(), &[2.0, -2.0]);
//! layer.step_gradient(-0.1);
//! ```

/// Persisted layer records.
pub mod codec;
/// Layer parameters and declarative configuration.
pub mod config;
/// Error types.
pub mod error;
/// The dense layer itself.
pub mod layer;
/// RNG helpers for initialization.
pub mod rng;
/// Network-facing layer trait.
pub mod traits;

pub use codec::{Format, LAYER_TYPE, RECORD_VERSION};
pub use config::{DenseParams, LayerConfig};
pub use error::{ConfigError, DecodeError, EncodeError, LayerError};
pub use layer::DenseLayer;
pub use traits::Layer;
