#![forbid(unsafe_code)]

use activation::ActivationError;

/// Failures reported by layer operations. None of them mutate the layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    /// A vector or weight row had the wrong length
    #[error("{what} has length {actual}, expected {expected}")]
    ShapeMismatch {
        /// which vector was rejected
        what: &'static str,
        /// length the layer requires
        expected: usize,
        /// length that was supplied
        actual: usize,
    },
    /// A cache buffer of the requested length could not be allocated
    #[error("cannot allocate {what} of length {len}")]
    Allocation {
        /// which buffer was being allocated
        what: &'static str,
        /// requested number of elements
        len: usize,
    },
    /// Forward propagation was requested before any input was set
    #[error("no input has been set")]
    MissingInput,
    /// Backward propagation was requested before a downstream gradient was set
    #[error("no downstream gradient has been set")]
    MissingDownstreamGradient,
    /// Backward propagation would read sums from an older input or older parameters
    #[error("forward propagation has not run since the input or parameters changed")]
    StaleForward,
}

/// Failures while turning persisted bytes back into a layer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not a valid JSON record
    #[error("malformed json record: {0}")]
    Json(#[from] serde_json::Error),
    /// The bytes are not a valid bincode record
    #[error("malformed bincode record: {0}")]
    Bincode(#[from] bincode::Error),
    /// The record describes some other kind of layer
    #[error("expected layer type {expected:?}, got {actual:?}")]
    LayerType {
        /// tag this decoder handles
        expected: &'static str,
        /// tag found in the record
        actual: String,
    },
    /// The record was written by an incompatible encoder
    #[error("unsupported record version {0}")]
    Version(u32),
    /// The activation could not be reconstructed
    #[error(transparent)]
    Activation(#[from] ActivationError),
    /// Stored weights or biases disagree with the declared dimensions, or the
    /// declared dimensions cannot be allocated
    #[error("invalid record: {0}")]
    Shape(#[from] LayerError),
}

/// Failures while persisting a layer.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON has no representation for NaN or infinities
    #[error("{what}[{index}] is not finite")]
    NonFinite {
        /// which parameter vector holds the value
        what: &'static str,
        /// flattened index of the value
        index: usize,
    },
    /// JSON serialization failed
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    /// bincode serialization failed
    #[error("bincode encoding failed: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Failures while building a layer from a [`crate::LayerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text could not be parsed
    #[error("invalid layer config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configured activation is unknown or its payload is malformed
    #[error(transparent)]
    Activation(#[from] ActivationError),
}
