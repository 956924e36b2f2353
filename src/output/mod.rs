//! Reusable output buffer for quantized vectors.

use crate::state::ScalarQuantizationType;

/// Scratch buffer holding one bit-packed encoded vector.
///
/// The buffer is owned by the caller and reused across many `quantize`
/// calls to keep allocation off the hot encode path. It must not be shared
/// across concurrent callers; one buffer per thread, reused serially.
#[derive(Debug)]
pub struct QuantizationOutput {
    sq_type: ScalarQuantizationType,
    /// Vector dimension the buffer is currently sized for, or `None` before
    /// the first `prepare` call.
    prepared_dimension: Option<usize>,
    packed: Vec<u8>,
}

impl QuantizationOutput {
    pub fn new(sq_type: ScalarQuantizationType) -> Self {
        Self {
            sq_type,
            prepared_dimension: None,
            packed: Vec::new(),
        }
    }

    /// The quantization sub-type this buffer encodes for.
    pub fn sq_type(&self) -> ScalarQuantizationType {
        self.sq_type
    }

    /// Whether the buffer is already sized for vectors of `dimension`.
    pub fn is_prepared(&self, dimension: usize) -> bool {
        self.prepared_dimension == Some(dimension)
    }

    /// Size the buffer for vectors of `dimension`, zeroing its contents.
    ///
    /// An unchanged dimension keeps the existing allocation; a changed one
    /// reallocates to exactly `ceil(bits * dimension / 8)` bytes.
    pub fn prepare(&mut self, dimension: usize) {
        let byte_len = self.sq_type.bytes_per_vector(dimension);
        if self.is_prepared(dimension) {
            self.packed.fill(0);
            return;
        }
        self.packed = vec![0u8; byte_len];
        self.prepared_dimension = Some(dimension);
    }

    /// The packed encoded bytes.
    pub fn quantized_vector(&self) -> &[u8] {
        &self.packed
    }

    /// Mutable access for bit packers.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.packed
    }
}
