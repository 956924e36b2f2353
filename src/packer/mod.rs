//! MSB-first bit packing for quantized vectors.
//!
//! Quantizers compare each coordinate against one or more threshold rows and
//! emit one bit per comparison. The bits are packed most-significant-bit
//! first: bit `i * dim + j` (row `i`, coordinate `j`) lands in byte
//! `pos >> 3` at bit `7 - (pos & 7)`. This exact layout is a persisted
//! compatibility surface; changing it requires an encoding version bump.

use crate::error::{QuantizationError, QuantizationResult};

/// Pack parallel rows of 0/1 values into a single byte buffer.
///
/// Each row is packed MSB-first into its own `ceil(len / 8)` byte run; the
/// runs are concatenated in row order. Rows must be non-empty and of equal
/// length.
pub fn pack_bits(rows: &[Vec<u8>]) -> QuantizationResult<Vec<u8>> {
    if rows.is_empty() {
        return Err(QuantizationError::InvalidConfiguration(
            "bit rows must not be empty".to_string(),
        ));
    }
    let row_len = rows[0].len();
    if row_len == 0 {
        return Err(QuantizationError::InvalidConfiguration(
            "bit rows must not be zero-length".to_string(),
        ));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != row_len {
            return Err(QuantizationError::InvalidConfiguration(format!(
                "bit row {} has length {}, expected {}",
                i,
                row.len(),
                row_len
            )));
        }
    }

    let bytes_per_row = (row_len + 7) / 8;
    let mut packed = vec![0u8; bytes_per_row * rows.len()];
    for (row_idx, row) in rows.iter().enumerate() {
        let base = row_idx * bytes_per_row;
        for (j, &bit) in row.iter().enumerate() {
            if bit != 0 {
                packed[base + (j >> 3)] |= 1 << (7 - (j & 7));
            }
        }
    }
    Ok(packed)
}

/// Compare a vector against threshold rows and pack the result bits directly
/// into `packed`, avoiding any intermediate bit array.
///
/// Bit `i * dim + j` is set when `vector[j] >= thresholds[i][j]`; a value
/// exactly equal to its threshold always encodes as 1. `packed` must hold at
/// least `ceil(thresholds.len() * vector.len() / 8)` zeroed bytes.
#[inline]
pub fn quantize_and_pack_bits(vector: &[f32], thresholds: &[Vec<f32>], packed: &mut [u8]) {
    let dim = vector.len();
    for (i, row) in thresholds.iter().enumerate() {
        for (j, &value) in vector.iter().enumerate() {
            if value >= row[j] {
                let pos = i * dim + j;
                packed[pos >> 3] |= 1 << (7 - (pos & 7));
            }
        }
    }
}

/// One-bit convenience form of [`quantize_and_pack_bits`].
#[inline]
pub fn quantize_and_pack_bits_one_bit(vector: &[f32], thresholds: &[f32], packed: &mut [u8]) {
    for (j, &value) in vector.iter().enumerate() {
        if value >= thresholds[j] {
            packed[j >> 3] |= 1 << (7 - (j & 7));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_two_full_rows() {
        let rows = vec![vec![0, 1, 0, 1, 1, 0, 1, 1], vec![1, 0, 1, 0, 0, 1, 0, 0]];
        assert_eq!(pack_bits(&rows).unwrap(), vec![0b0101_1011, 0b1010_0100]);
    }

    #[test]
    fn test_pack_single_bit_row() {
        assert_eq!(pack_bits(&[vec![1]]).unwrap(), vec![0b1000_0000]);
    }

    #[test]
    fn test_pack_partial_row_pads_low_bits() {
        // 6 bits used, last two bits of the byte stay 0
        assert_eq!(pack_bits(&[vec![1, 1, 0, 1, 1, 1]]).unwrap(), vec![0b1101_1100]);
    }

    #[test]
    fn test_empty_rows_rejected() {
        assert!(matches!(
            pack_bits(&[]),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            pack_bits(&[vec![]]),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_mismatched_row_lengths_rejected() {
        let rows = vec![vec![0, 1, 0], vec![1, 0]];
        assert!(matches!(
            pack_bits(&rows),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_quantize_and_pack_one_bit() {
        let vector = [1.0, 5.0, 3.0];
        let thresholds = [2.0, 3.0, 4.0];
        let mut packed = [0u8; 1];
        quantize_and_pack_bits_one_bit(&vector, &thresholds, &mut packed);
        assert_eq!(packed, [0b0100_0000]);
    }

    #[test]
    fn test_equal_to_threshold_encodes_as_one() {
        let mut packed = [0u8; 1];
        quantize_and_pack_bits_one_bit(&[2.0], &[2.0], &mut packed);
        assert_eq!(packed, [0b1000_0000]);
    }

    #[test]
    fn test_quantize_and_pack_two_rows() {
        let vector = [1.2, 3.4, 5.6];
        let thresholds = vec![vec![1.0, 3.0, 5.0], vec![1.5, 3.5, 5.5]];
        let mut packed = [0u8; 1];
        quantize_and_pack_bits(&vector, &thresholds, &mut packed);
        // row 0: 111, row 1: 001 -> bits 111001 packed MSB-first
        assert_eq!(packed, [0b1110_0100]);
    }
}
