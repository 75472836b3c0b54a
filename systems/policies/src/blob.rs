//! Single-line text transfer format for network weights.
//!
//! `policy:v1:<dtype>:<in>x<out>,<in>x<out>,...:<base64 payload>` where the
//! payload holds every parameter in little-endian order, layer by layer,
//! weights first (row-major, input by output) and biases second.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thiserror::Error;

const BLOB_DOMAIN: &str = "policy";
const BLOB_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';
const SHAPE_DELIMITER: char = ',';

/// Numeric type of the stored parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl Dtype {
    /// Bytes occupied by one parameter.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        })
    }
}

impl FromStr for Dtype {
    type Err = BlobError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "f32" | "float32" => Ok(Self::F32),
            "f64" | "float64" => Ok(Self::F64),
            other => Err(BlobError::UnsupportedDtype(other.to_owned())),
        }
    }
}

/// Versioned weight blob: layer shapes, numeric type and flat parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightBlob {
    shapes: Vec<(usize, usize)>,
    dtype: Dtype,
    params: Vec<f64>,
}

impl WeightBlob {
    /// Creates a blob after checking that `params` fills every layer exactly.
    pub fn new(shapes: Vec<(usize, usize)>, dtype: Dtype, params: Vec<f64>) -> Result<Self, BlobError> {
        if shapes.is_empty() {
            return Err(BlobError::MissingLayers);
        }
        if let Some(&(inputs, outputs)) = shapes.iter().find(|(i, o)| *i == 0 || *o == 0) {
            return Err(BlobError::EmptyLayer { inputs, outputs });
        }
        for pair in shapes.windows(2) {
            if pair[0].1 != pair[1].0 {
                return Err(BlobError::DisconnectedLayers {
                    outputs: pair[0].1,
                    inputs: pair[1].0,
                });
            }
        }
        let expected = parameter_count(&shapes).ok_or(BlobError::ShapeOverflow)?;
        if params.len() != expected {
            return Err(BlobError::ParameterCount {
                expected,
                actual: params.len(),
            });
        }
        Ok(Self {
            shapes,
            dtype,
            params,
        })
    }

    /// Builds a blob from parts already known to line up.
    pub(crate) fn from_parts(shapes: Vec<(usize, usize)>, dtype: Dtype, params: Vec<f64>) -> Self {
        debug_assert_eq!(Some(params.len()), parameter_count(&shapes));
        Self {
            shapes,
            dtype,
            params,
        }
    }

    /// `(inputs, outputs)` of every layer in order.
    #[must_use]
    pub fn shapes(&self) -> &[(usize, usize)] {
        &self.shapes
    }

    /// Numeric type used on the wire.
    #[must_use]
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Flat parameters, widened to `f64`.
    #[must_use]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Encodes the blob into a single line suitable for a file or clipboard.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(self.params.len() * self.dtype.width());
        for value in &self.params {
            match self.dtype {
                Dtype::F32 => bytes.extend_from_slice(&(*value as f32).to_le_bytes()),
                Dtype::F64 => bytes.extend_from_slice(&value.to_le_bytes()),
            }
        }
        let shapes = self
            .shapes
            .iter()
            .map(|(inputs, outputs)| format!("{inputs}x{outputs}"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{BLOB_DOMAIN}:{BLOB_VERSION}:{}:{shapes}:{}",
            self.dtype,
            STANDARD_NO_PAD.encode(bytes)
        )
    }

    /// Decodes a blob from its text form.
    pub fn decode(value: &str) -> Result<Self, BlobError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BlobError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(BlobError::MissingField("prefix"))?;
        let version = parts.next().ok_or(BlobError::MissingField("version"))?;
        let dtype = parts.next().ok_or(BlobError::MissingField("dtype"))?;
        let shapes = parts.next().ok_or(BlobError::MissingField("shapes"))?;
        let payload = parts.next().ok_or(BlobError::MissingField("payload"))?;
        if parts.next().is_some() {
            return Err(BlobError::TrailingFields);
        }

        if domain != BLOB_DOMAIN {
            return Err(BlobError::InvalidPrefix(domain.to_owned()));
        }
        if version != BLOB_VERSION {
            return Err(BlobError::UnsupportedVersion(version.to_owned()));
        }

        let dtype: Dtype = dtype.parse()?;
        let shapes = shapes
            .split(SHAPE_DELIMITER)
            .map(parse_shape)
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        if bytes.len() % dtype.width() != 0 {
            return Err(BlobError::TruncatedPayload { bytes: bytes.len() });
        }

        let params = match dtype {
            Dtype::F32 => bytes
                .chunks_exact(4)
                .map(|chunk| f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])))
                .collect(),
            Dtype::F64 => bytes
                .chunks_exact(8)
                .map(|chunk| {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(chunk);
                    f64::from_le_bytes(raw)
                })
                .collect(),
        };

        Self::new(shapes, dtype, params)
    }
}

/// Number of parameters needed for the provided layer shapes, or `None` when
/// the count does not fit in `usize`.
#[must_use]
fn parameter_count(shapes: &[(usize, usize)]) -> Option<usize> {
    shapes.iter().try_fold(0usize, |total, &(inputs, outputs)| {
        inputs
            .checked_mul(outputs)
            .and_then(|weights| weights.checked_add(outputs))
            .and_then(|layer| total.checked_add(layer))
    })
}

fn parse_shape(shape: &str) -> Result<(usize, usize), BlobError> {
    let invalid = || BlobError::InvalidShape(shape.to_owned());
    let (inputs, outputs) = shape.split_once(['x', 'X']).ok_or_else(invalid)?;
    let inputs = inputs.trim().parse::<usize>().map_err(|_| invalid())?;
    let outputs = outputs.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((inputs, outputs))
}

/// Errors that can occur while building or decoding weight blobs.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The provided string was empty or contained only whitespace.
    #[error("weight blob was empty")]
    EmptyPayload,
    /// A `:`-separated field was missing.
    #[error("weight blob is missing the {0}")]
    MissingField(&'static str),
    /// The blob used an unexpected prefix.
    #[error("weight blob prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The blob used an unsupported version identifier.
    #[error("weight blob version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The numeric type tag is unknown.
    #[error("dtype '{0}' is not supported")]
    UnsupportedDtype(String),
    /// A layer shape could not be parsed.
    #[error("could not parse layer shape '{0}'")]
    InvalidShape(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode weight payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload length is not a whole number of parameters.
    #[error("payload of {bytes} bytes does not hold whole parameters")]
    TruncatedPayload {
        /// Decoded payload length.
        bytes: usize,
    },
    /// More `:`-separated fields followed the payload.
    #[error("weight blob has fields after the payload")]
    TrailingFields,
    /// The layer shapes describe more parameters than can be addressed.
    #[error("layer shapes describe too many parameters")]
    ShapeOverflow,
    /// No layers were described.
    #[error("weight blob describes no layers")]
    MissingLayers,
    /// A layer has no inputs or no outputs.
    #[error("layer {inputs}x{outputs} has a zero dimension")]
    EmptyLayer {
        /// Layer inputs.
        inputs: usize,
        /// Layer outputs.
        outputs: usize,
    },
    /// Consecutive layers do not line up.
    #[error("layer outputs {outputs} do not match next layer inputs {inputs}")]
    DisconnectedLayers {
        /// Outputs of the earlier layer.
        outputs: usize,
        /// Inputs of the later layer.
        inputs: usize,
    },
    /// The parameter buffer does not match the layer shapes.
    #[error("expected {expected} parameters, found {actual}")]
    ParameterCount {
        /// Parameters required by the shapes.
        expected: usize,
        /// Parameters present.
        actual: usize,
    },
    /// The network does not fit the observation or action space.
    #[error("network maps {inputs} inputs to {outputs} outputs; expected {expected_inputs} to {expected_outputs}")]
    IncompatibleNetwork {
        /// Network input width.
        inputs: usize,
        /// Network output width.
        outputs: usize,
        /// Required input width.
        expected_inputs: usize,
        /// Required output width.
        expected_outputs: usize,
    },
}
