#![forbid(unsafe_code)]

//! Persisted form of a [`DenseLayer`].
//!
//! A record carries its own layer type tag and version, the activation's tag and
//! payload, the parameters, and the dimensions. Dimensions are stored explicitly so a
//! truncated weight matrix is caught on load instead of silently reshaping the caches.

use activation::ActivationRegistry;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError, LayerError};
use crate::layer::DenseLayer;

/// Type tag identifying a dense layer among other layer kinds.
pub const LAYER_TYPE: &str = "denselayer";

/// Version written by this encoder.
pub const RECORD_VERSION: u32 = 1;

/// Byte encoding of a persisted record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Human-readable JSON with exact float round-trips
    #[default]
    Json,
    /// Compact bincode
    Bincode,
}

#[derive(Serialize, Deserialize, Debug)]
struct SerializedDenseLayer {
    version: u32,
    layer_type: String,

    activation_type: String,
    activation_data: Vec<u8>,

    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,

    input_size: usize,
    output_size: usize,
}

fn check_finite(layer: &DenseLayer) -> Result<(), EncodeError> {
    if let Some(index) = layer.biases().iter().position(|b| !b.is_finite()) {
        return Err(EncodeError::NonFinite {
            what: "biases",
            index,
        });
    }
    if let Some(index) = layer.weights().iter().flatten().position(|w| !w.is_finite()) {
        return Err(EncodeError::NonFinite {
            what: "weights",
            index,
        });
    }
    Ok(())
}

impl DenseLayer {
    /// Encode this layer as JSON.
    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        self.serialize_as(Format::Json)
    }

    /// Encode this layer in the given format.
    ///
    /// JSON cannot carry NaN or infinite parameters, so those fail with
    /// [`EncodeError::NonFinite`]; bincode stores them as-is.
    pub fn serialize_as(&self, format: Format) -> Result<Vec<u8>, EncodeError> {
        let record = SerializedDenseLayer {
            version: RECORD_VERSION,
            layer_type: LAYER_TYPE.to_string(),
            activation_type: self.activation().serializer_type().to_string(),
            activation_data: self.activation().serialize(),
            weights: self.weights().to_vec(),
            biases: self.biases().to_vec(),
            input_size: self.input_count(),
            output_size: self.output_count(),
        };
        let bytes = match format {
            Format::Json => {
                check_finite(self)?;
                serde_json::to_vec(&record)?
            }
            Format::Bincode => bincode::serialize(&record)?,
        };
        tracing::trace!(?format, len = bytes.len(), "encoded dense layer");
        Ok(bytes)
    }

    /// Tag a multi-kind layer decoder dispatches on.
    pub fn serializer_type(&self) -> &'static str {
        LAYER_TYPE
    }

    /// Decode a JSON record using the stock activations.
    pub fn deserialize(data: &[u8]) -> Result<Self, DecodeError> {
        Self::deserialize_with(data, Format::Json, &ActivationRegistry::default())
    }

    /// Decode a record, restoring the activation through `registry`.
    ///
    /// No partial layer is ever returned: weights, biases and the declared sizes must
    /// all agree.
    pub fn deserialize_with(
        data: &[u8],
        format: Format,
        registry: &ActivationRegistry,
    ) -> Result<Self, DecodeError> {
        let record: SerializedDenseLayer = match format {
            Format::Json => serde_json::from_slice(data)?,
            Format::Bincode => bincode::deserialize(data)?,
        };
        if record.layer_type != LAYER_TYPE {
            return Err(DecodeError::LayerType {
                expected: LAYER_TYPE,
                actual: record.layer_type,
            });
        }
        if record.version != RECORD_VERSION {
            return Err(DecodeError::Version(record.version));
        }
        if record.weights.len() != record.output_size {
            return Err(LayerError::ShapeMismatch {
                what: "weight rows",
                expected: record.output_size,
                actual: record.weights.len(),
            }
            .into());
        }

        let activation = registry.deserialize(&record.activation_type, &record.activation_data)?;
        let layer = DenseLayer::from_parameters(
            record.input_size,
            record.weights,
            record.biases,
            activation,
        )?;
        tracing::debug!(
            ?format,
            input_size = layer.input_count(),
            output_size = layer.output_count(),
            activation = %record.activation_type,
            "decoded dense layer"
        );
        Ok(layer)
    }
}
