//! Reconstruction of approximate float vectors from quantized byte payloads.
//!
//! Used during query-time rescoring when only the quantized bytes were
//! retained on disk. Reconstructors are independent of the scalar
//! quantization training path but share the "quantized bytes to floats"
//! contract. Encodings are little-endian on disk regardless of the host's
//! native byte order.

use crate::error::{QuantizationError, QuantizationResult};

/// Decodes one quantized vector payload into an approximate float vector.
pub trait Reconstructor: Send + Sync {
    /// Vector dimension this reconstructor produces.
    fn dimension(&self) -> usize;

    /// Encoded byte length of one vector.
    fn bytes_per_vector(&self) -> usize;

    /// Decode `bytes` into `out`. `bytes` must be exactly
    /// [`bytes_per_vector`](Self::bytes_per_vector) long and `out` exactly
    /// [`dimension`](Self::dimension) long.
    fn reconstruct(&self, bytes: &[u8], out: &mut [f32]) -> QuantizationResult<()>;
}

/// Available reconstructor implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructorKind {
    /// One byte per coordinate, stored as unsigned 0..=255, value = byte - 128.
    ByteDirectSigned,
    /// Two bytes per coordinate, IEEE 754 half precision, little-endian.
    Fp16,
}

/// Create a reconstructor for the given encoding and dimension.
pub fn create_reconstructor(kind: ReconstructorKind, dimension: usize) -> Box<dyn Reconstructor> {
    match kind {
        ReconstructorKind::ByteDirectSigned => {
            Box::new(ByteDirectSignedReconstructor::new(dimension))
        }
        ReconstructorKind::Fp16 => Box::new(Fp16Reconstructor::new(dimension)),
    }
}

fn check_lengths(
    bytes: &[u8],
    out: &[f32],
    expected_bytes: usize,
    dimension: usize,
) -> QuantizationResult<()> {
    if bytes.len() != expected_bytes {
        return Err(QuantizationError::InvalidData(format!(
            "encoded payload is {} bytes, expected {}",
            bytes.len(),
            expected_bytes
        )));
    }
    if out.len() != dimension {
        return Err(QuantizationError::DimensionMismatch {
            expected: dimension,
            got: out.len(),
        });
    }
    Ok(())
}

/// Signed 8-bit direct encoding.
///
/// Each stored byte is the unsigned representation of `value + 128`;
/// negative floats wrap through two's complement. The byte must be widened
/// as unsigned before subtracting, otherwise sign extension corrupts the
/// magnitude.
pub struct ByteDirectSignedReconstructor {
    dimension: usize,
}

impl ByteDirectSignedReconstructor {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Reconstructor for ByteDirectSignedReconstructor {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn bytes_per_vector(&self) -> usize {
        self.dimension
    }

    fn reconstruct(&self, bytes: &[u8], out: &mut [f32]) -> QuantizationResult<()> {
        check_lengths(bytes, out, self.bytes_per_vector(), self.dimension)?;
        for (value, &byte) in out.iter_mut().zip(bytes.iter()) {
            *value = (byte as i32 - 128) as f32;
        }
        Ok(())
    }
}

/// FP16 encoding: every two bytes form one half-precision float, low byte
/// first.
pub struct Fp16Reconstructor {
    dimension: usize,
}

impl Fp16Reconstructor {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Reconstructor for Fp16Reconstructor {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn bytes_per_vector(&self) -> usize {
        self.dimension * 2
    }

    fn reconstruct(&self, bytes: &[u8], out: &mut [f32]) -> QuantizationResult<()> {
        check_lengths(bytes, out, self.bytes_per_vector(), self.dimension)?;
        for (value, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
            let bits = u16::from_le_bytes([pair[0], pair[1]]);
            *value = half::f16::from_bits(bits).to_f32();
        }
        Ok(())
    }
}
