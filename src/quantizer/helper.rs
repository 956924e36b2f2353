//! Shared training statistics for the scalar quantizers.
//!
//! All statistics are computed over the sampled positions only, scanning the
//! forward-only training request in ascending position order. The request is
//! reset before every pass so repeated passes see the same population.

use crate::error::{QuantizationError, QuantizationResult};
use crate::quantizer::rotation::apply_rotation;
use crate::training::TrainingRequest;

/// Per-dimension mean and standard deviation, plus the average L2/L1 norm
/// ratio over the sample. Single pass, Welford's online algorithm for the
/// variance.
pub(crate) struct SampleStatistics {
    pub mean: Vec<f32>,
    pub std_dev: Vec<f32>,
    pub average_l2_l1_ratio: f64,
}

pub(crate) fn calculate_statistics(
    request: &mut TrainingRequest<'_>,
    sampled_positions: &[u32],
    rotation_matrix: Option<&[Vec<f32>]>,
) -> QuantizationResult<SampleStatistics> {
    if sampled_positions.is_empty() {
        return Err(QuantizationError::InvalidConfiguration(
            "sampled positions must not be empty".to_string(),
        ));
    }

    request.reset();
    let mut mean: Vec<f32> = Vec::new();
    let mut m2: Vec<f32> = Vec::new();
    let mut ratio_sum = 0.0f64;
    let mut ratio_count = 0usize;
    let mut count = 0usize;

    for &position in sampled_positions {
        let vector = request
            .vector_at_position(position as usize)
            .ok_or(QuantizationError::EmptyTrainingData)?;
        let vector = match rotation_matrix {
            Some(matrix) => apply_rotation(&vector, matrix),
            None => vector,
        };

        if mean.is_empty() {
            mean = vec![0.0; vector.len()];
            m2 = vec![0.0; vector.len()];
        } else if vector.len() != mean.len() {
            return Err(QuantizationError::DimensionMismatch {
                expected: mean.len(),
                got: vector.len(),
            });
        }

        count += 1;
        let mut l1 = 0.0f64;
        let mut l2_squared = 0.0f64;
        for (i, &value) in vector.iter().enumerate() {
            let delta = value - mean[i];
            mean[i] += delta / count as f32;
            let delta2 = value - mean[i];
            m2[i] += delta * delta2;

            l1 += value.abs() as f64;
            l2_squared += (value as f64) * (value as f64);
        }
        // Zero vectors have no defined ratio; they contribute to neither
        // the sum nor the divisor.
        if l1 > 0.0 {
            ratio_sum += l2_squared.sqrt() / l1;
            ratio_count += 1;
        }
    }

    let std_dev = m2
        .iter()
        .map(|&m| (m / count as f32).sqrt())
        .collect();

    let average_l2_l1_ratio = if ratio_count > 0 {
        ratio_sum / ratio_count as f64
    } else {
        0.0
    };

    Ok(SampleStatistics {
        mean,
        std_dev,
        average_l2_l1_ratio,
    })
}

/// Threshold matrix of shape `bits x dim`, spread around the mean in
/// balanced steps of the standard deviation:
/// `thresholds[b][d] = mean[d] + (-1 + 2(b+1)/(bits+1)) * std_dev[d]`.
///
/// Row 0 is the lowest (most significant) boundary. For one bit this
/// degenerates to the mean itself.
pub(crate) fn calculate_thresholds(
    mean: &[f32],
    std_dev: &[f32],
    bits_per_coordinate: usize,
) -> Vec<Vec<f32>> {
    let coef = (bits_per_coordinate + 1) as f32;
    (0..bits_per_coordinate)
        .map(|b| {
            let i_coef = -1.0 + 2.0 * (b + 1) as f32 / coef;
            mean.iter()
                .zip(std_dev.iter())
                .map(|(&m, &s)| m + i_coef * s)
                .collect()
        })
        .collect()
}

/// Per-dimension means of the training values strictly below and at-or-above
/// the one-bit thresholds. Second scan over the sample; used for asymmetric
/// distance correction at query time.
pub(crate) fn calculate_below_above_means(
    request: &mut TrainingRequest<'_>,
    thresholds: &[f32],
    sampled_positions: &[u32],
    rotation_matrix: Option<&[Vec<f32>]>,
) -> QuantizationResult<(Vec<f32>, Vec<f32>)> {
    let dim = thresholds.len();
    let mut below_sum = vec![0.0f64; dim];
    let mut above_sum = vec![0.0f64; dim];
    let mut below_count = vec![0usize; dim];
    let mut above_count = vec![0usize; dim];

    request.reset();
    for &position in sampled_positions {
        let vector = request
            .vector_at_position(position as usize)
            .ok_or(QuantizationError::EmptyTrainingData)?;
        let vector = match rotation_matrix {
            Some(matrix) => apply_rotation(&vector, matrix),
            None => vector,
        };
        if vector.len() != dim {
            return Err(QuantizationError::DimensionMismatch {
                expected: dim,
                got: vector.len(),
            });
        }

        for (d, &value) in vector.iter().enumerate() {
            if value < thresholds[d] {
                below_sum[d] += value as f64;
                below_count[d] += 1;
            } else {
                above_sum[d] += value as f64;
                above_count[d] += 1;
            }
        }
    }

    let below = below_sum
        .iter()
        .zip(below_count.iter())
        .map(|(&sum, &n)| if n > 0 { (sum / n as f64) as f32 } else { 0.0 })
        .collect();
    let above = above_sum
        .iter()
        .zip(above_count.iter())
        .map(|(&sum, &n)| if n > 0 { (sum / n as f64) as f32 } else { 0.0 })
        .collect();
    Ok((below, above))
}
