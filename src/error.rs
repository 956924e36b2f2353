//! Error types for quantization operations.

use std::io;
use thiserror::Error;

/// Errors that can occur during quantization training, encoding,
/// state serialization, or registry lookup.
#[derive(Error, Debug)]
pub enum QuantizationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported quantization scheme: kind {kind}, type identifier {type_identifier}")]
    UnsupportedScheme { kind: String, type_identifier: String },

    #[error("Training data is empty: no vectors available at sampled positions")]
    EmptyTrainingData,

    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid magic number: expected {expected:#x}, got {got:#x}")]
    InvalidMagicNumber { expected: u32, got: u32 },

    #[error("Unsupported state version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for quantization operations.
pub type QuantizationResult<T> = Result<T, QuantizationError>;
