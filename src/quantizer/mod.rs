//! Scalar quantizer implementations.
//!
//! Quantizers are stateless algorithm objects: `train` consumes a
//! [`TrainingRequest`] and produces an immutable [`QuantizationState`];
//! `quantize` encodes one vector against a state into a caller-owned
//! [`QuantizationOutput`]. `quantize` is safe to call concurrently across
//! threads as long as each caller owns its output buffer.

pub mod helper;
pub mod rotation;

use crate::error::{QuantizationError, QuantizationResult};
use crate::output::QuantizationOutput;
use crate::packer;
use crate::sampler::{ReservoirSampler, Sampler};
use crate::state::{
    MultiBitScalarQuantizationState, OneBitScalarQuantizationState, QuantizationState,
    ScalarQuantizationType,
};
use crate::training::TrainingRequest;
use tracing::debug;

/// Default number of vectors sampled for training, matching the segment-level
/// sampling size used by the host engine.
pub const DEFAULT_SAMPLE_SIZE: usize = 25_000;

/// Exponent of the extra ADC correction term applied for L2 spaces.
pub const ADC_CORRECTION_FACTOR: f64 = 2.0;

/// Distance space a query will be scored in; only used to decide whether the
/// ADC transform applies its correction term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    L2,
    InnerProduct,
    Cosine,
}

/// A trainable vector quantization algorithm.
pub trait Quantizer: Send + Sync {
    /// Train quantization parameters from a sampled subset of the request's
    /// population.
    fn train(&self, request: &mut TrainingRequest<'_>) -> QuantizationResult<QuantizationState>;

    /// Encode one vector against a trained state into `output`.
    fn quantize(
        &self,
        vector: &[f32],
        state: &QuantizationState,
        output: &mut QuantizationOutput,
    ) -> QuantizationResult<()>;

    /// Rescale a full-precision query vector into the quantized space so it
    /// can be scored against bit-packed document vectors (asymmetric
    /// distance computation). Only meaningful for quantizers that retain
    /// below/above-threshold statistics.
    fn transform_with_adc(
        &self,
        _vector: &mut [f32],
        _state: &QuantizationState,
        _metric: Metric,
    ) -> QuantizationResult<()> {
        Err(QuantizationError::InvalidConfiguration(
            "ADC transform is not supported by this quantizer".to_string(),
        ))
    }
}

/// An output buffer sized for the wrong sub-type would under-allocate and
/// the packer would write past the buffer; reject it up front.
fn check_output_type(
    output: &QuantizationOutput,
    sq_type: ScalarQuantizationType,
) -> QuantizationResult<()> {
    if output.sq_type() != sq_type {
        return Err(QuantizationError::InvalidConfiguration(format!(
            "output buffer was created for {} quantization, state requires {}",
            output.sq_type().type_identifier(),
            sq_type.type_identifier()
        )));
    }
    Ok(())
}

/// One-bit scalar quantizer.
///
/// Training computes the per-dimension mean over the sampled population and
/// uses it as the threshold vector; encoding emits bit 1 for every
/// coordinate at or above its threshold.
pub struct OneBitScalarQuantizer {
    sample_size: usize,
    sampler: Box<dyn Sampler>,
    rotation_seed: Option<u64>,
}

impl OneBitScalarQuantizer {
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            sampler: Box::new(ReservoirSampler::new()),
            rotation_seed: None,
        }
    }

    pub fn with_sample_size(sample_size: usize, sampler: Box<dyn Sampler>) -> Self {
        Self {
            sample_size,
            sampler,
            rotation_seed: None,
        }
    }

    /// Fix the rotation RNG seed, for reproducible training runs.
    pub fn with_rotation_seed(mut self, seed: u64) -> Self {
        self.rotation_seed = Some(seed);
        self
    }
}

impl Default for OneBitScalarQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Quantizer for OneBitScalarQuantizer {
    fn train(&self, request: &mut TrainingRequest<'_>) -> QuantizationResult<QuantizationState> {
        let params = *request.params();
        let sampled = self
            .sampler
            .sample(request.total_vectors(), self.sample_size);
        if sampled.is_empty() {
            return Err(QuantizationError::EmptyTrainingData);
        }

        // The rotation is generated from the dimension of the first sampled
        // vector and baked into the state; all statistics are computed in
        // rotated space.
        let rotation_matrix = if params.enable_random_rotation {
            request.reset();
            let first = request
                .vector_at_position(sampled[0] as usize)
                .ok_or(QuantizationError::EmptyTrainingData)?;
            Some(rotation::generate_rotation_matrix(
                first.len(),
                self.rotation_seed,
            ))
        } else {
            None
        };

        let stats = helper::calculate_statistics(request, &sampled, rotation_matrix.as_deref())?;
        // For one bit the threshold row degenerates to the per-dimension mean.
        let mean_thresholds = stats.mean.clone();
        let (below, above) = helper::calculate_below_above_means(
            request,
            &mean_thresholds,
            &sampled,
            rotation_matrix.as_deref(),
        )?;

        debug!(
            sampled = sampled.len(),
            dimension = mean_thresholds.len(),
            "trained one-bit scalar quantizer"
        );
        Ok(QuantizationState::OneBit(OneBitScalarQuantizationState {
            params,
            mean_thresholds,
            below_threshold_means: Some(below),
            above_threshold_means: Some(above),
            average_l2_l1_ratio: Some(stats.average_l2_l1_ratio),
            rotation_matrix,
        }))
    }

    fn quantize(
        &self,
        vector: &[f32],
        state: &QuantizationState,
        output: &mut QuantizationOutput,
    ) -> QuantizationResult<()> {
        let binary_state = match state {
            QuantizationState::OneBit(s) => s,
            QuantizationState::MultiBit(_) => {
                return Err(QuantizationError::InvalidConfiguration(
                    "one-bit quantizer requires a one-bit quantization state".to_string(),
                ))
            }
        };
        if binary_state.mean_thresholds.len() != vector.len() {
            return Err(QuantizationError::DimensionMismatch {
                expected: binary_state.mean_thresholds.len(),
                got: vector.len(),
            });
        }
        check_output_type(output, binary_state.params.sq_type)?;

        output.prepare(vector.len());
        match &binary_state.rotation_matrix {
            Some(matrix) => {
                let rotated = rotation::apply_rotation(vector, matrix);
                packer::quantize_and_pack_bits_one_bit(
                    &rotated,
                    &binary_state.mean_thresholds,
                    output.as_mut_slice(),
                );
            }
            None => packer::quantize_and_pack_bits_one_bit(
                vector,
                &binary_state.mean_thresholds,
                output.as_mut_slice(),
            ),
        }
        Ok(())
    }

    fn transform_with_adc(
        &self,
        vector: &mut [f32],
        state: &QuantizationState,
        metric: Metric,
    ) -> QuantizationResult<()> {
        let binary_state = match state {
            QuantizationState::OneBit(s) => s,
            QuantizationState::MultiBit(_) => {
                return Err(QuantizationError::InvalidConfiguration(
                    "ADC transform requires a one-bit quantization state".to_string(),
                ))
            }
        };
        let below = binary_state.below_threshold_means.as_ref().ok_or_else(|| {
            QuantizationError::InvalidConfiguration(
                "state is missing below-threshold means required for ADC".to_string(),
            )
        })?;
        let above = binary_state.above_threshold_means.as_ref().ok_or_else(|| {
            QuantizationError::InvalidConfiguration(
                "state is missing above-threshold means required for ADC".to_string(),
            )
        })?;
        if vector.len() != below.len() {
            return Err(QuantizationError::DimensionMismatch {
                expected: below.len(),
                got: vector.len(),
            });
        }

        if let Some(matrix) = &binary_state.rotation_matrix {
            let rotated = rotation::apply_rotation(vector, matrix);
            vector.copy_from_slice(&rotated);
        }

        // The correction term only holds for L2; it would break the
        // normalization cosine-space vectors rely on.
        let correct = metric == Metric::L2;
        for (i, value) in vector.iter_mut().enumerate() {
            let span = above[i] - below[i];
            if span == 0.0 {
                *value = 0.5;
                continue;
            }
            *value = (*value - below[i]) / span;
            if correct {
                let correction = (span as f64).powf(ADC_CORRECTION_FACTOR) as f32;
                *value = correction * (*value - 0.5) + 0.5;
            }
        }
        Ok(())
    }
}

/// Multi-bit scalar quantizer, 2 or 4 bits per coordinate.
///
/// Each bit plane compares the vector against one threshold row exactly as
/// the one-bit case; planes are packed in bit-significance order (row 0
/// first).
pub struct MultiBitScalarQuantizer {
    sq_type: ScalarQuantizationType,
    sample_size: usize,
    sampler: Box<dyn Sampler>,
    rotation_seed: Option<u64>,
}

impl MultiBitScalarQuantizer {
    /// Create a multi-bit quantizer; `sq_type` must be two- or four-bit.
    pub fn new(sq_type: ScalarQuantizationType) -> QuantizationResult<Self> {
        Self::with_sample_size(sq_type, DEFAULT_SAMPLE_SIZE, Box::new(ReservoirSampler::new()))
    }

    pub fn with_sample_size(
        sq_type: ScalarQuantizationType,
        sample_size: usize,
        sampler: Box<dyn Sampler>,
    ) -> QuantizationResult<Self> {
        if sq_type == ScalarQuantizationType::OneBit {
            return Err(QuantizationError::InvalidConfiguration(
                "multi-bit quantizer requires at least 2 bits per coordinate".to_string(),
            ));
        }
        Ok(Self {
            sq_type,
            sample_size,
            sampler,
            rotation_seed: None,
        })
    }

    /// Fix the rotation RNG seed, for reproducible training runs.
    pub fn with_rotation_seed(mut self, seed: u64) -> Self {
        self.rotation_seed = Some(seed);
        self
    }

    pub fn bits_per_coordinate(&self) -> usize {
        self.sq_type.bits_per_coordinate()
    }
}

impl Quantizer for MultiBitScalarQuantizer {
    fn train(&self, request: &mut TrainingRequest<'_>) -> QuantizationResult<QuantizationState> {
        let params = *request.params();
        let sampled = self
            .sampler
            .sample(request.total_vectors(), self.sample_size);
        if sampled.is_empty() {
            return Err(QuantizationError::EmptyTrainingData);
        }

        let rotation_matrix = if params.enable_random_rotation {
            request.reset();
            let first = request
                .vector_at_position(sampled[0] as usize)
                .ok_or(QuantizationError::EmptyTrainingData)?;
            Some(rotation::generate_rotation_matrix(
                first.len(),
                self.rotation_seed,
            ))
        } else {
            None
        };

        let stats = helper::calculate_statistics(request, &sampled, rotation_matrix.as_deref())?;
        let thresholds = helper::calculate_thresholds(
            &stats.mean,
            &stats.std_dev,
            self.bits_per_coordinate(),
        );

        debug!(
            sampled = sampled.len(),
            bits = self.bits_per_coordinate(),
            dimension = stats.mean.len(),
            "trained multi-bit scalar quantizer"
        );
        Ok(QuantizationState::MultiBit(MultiBitScalarQuantizationState {
            params,
            thresholds,
            below_threshold_means: None,
            above_threshold_means: None,
            average_l2_l1_ratio: Some(stats.average_l2_l1_ratio),
            rotation_matrix,
        }))
    }

    fn quantize(
        &self,
        vector: &[f32],
        state: &QuantizationState,
        output: &mut QuantizationOutput,
    ) -> QuantizationResult<()> {
        let multi_state = match state {
            QuantizationState::MultiBit(s) => s,
            QuantizationState::OneBit(_) => {
                return Err(QuantizationError::InvalidConfiguration(
                    "multi-bit quantizer requires a multi-bit quantization state".to_string(),
                ))
            }
        };
        let dim = multi_state.thresholds.first().map_or(0, |row| row.len());
        if dim != vector.len() {
            return Err(QuantizationError::DimensionMismatch {
                expected: dim,
                got: vector.len(),
            });
        }
        check_output_type(output, multi_state.params.sq_type)?;

        output.prepare(vector.len());
        match &multi_state.rotation_matrix {
            Some(matrix) => {
                let rotated = rotation::apply_rotation(vector, matrix);
                packer::quantize_and_pack_bits(
                    &rotated,
                    &multi_state.thresholds,
                    output.as_mut_slice(),
                );
            }
            None => packer::quantize_and_pack_bits(
                vector,
                &multi_state.thresholds,
                output.as_mut_slice(),
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ScalarQuantizationParams;
    use crate::training::TrainingRequest;

    fn request_for(
        vectors: Vec<Vec<f32>>,
        sq_type: ScalarQuantizationType,
    ) -> TrainingRequest<'static> {
        let total = vectors.len();
        TrainingRequest::new(
            move || vectors.clone().into_iter(),
            total,
            ScalarQuantizationParams::new(sq_type),
        )
    }

    fn training_vectors() -> Vec<Vec<f32>> {
        vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]]
    }

    #[test]
    fn test_one_bit_training_yields_mean_thresholds() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();
        match &state {
            QuantizationState::OneBit(s) => {
                assert_eq!(s.mean_thresholds, vec![4.0, 5.0, 6.0]);
                assert_eq!(s.below_threshold_means.as_ref().unwrap(), &vec![1.0, 2.0, 3.0]);
                assert_eq!(s.above_threshold_means.as_ref().unwrap(), &vec![5.5, 6.5, 7.5]);
                assert!(s.average_l2_l1_ratio.unwrap() > 0.0);
            }
            _ => panic!("expected one-bit state"),
        }
    }

    #[test]
    fn test_one_bit_quantize_below_threshold_is_zero() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        quantizer
            .quantize(&[1.0, 2.0, 3.0], &state, &mut output)
            .unwrap();
        assert_eq!(output.quantized_vector(), &[0x00]);
    }

    #[test]
    fn test_one_bit_quantize_at_threshold_is_one() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        quantizer
            .quantize(&[4.0, 5.0, 6.0], &state, &mut output)
            .unwrap();
        assert_eq!(output.quantized_vector(), &[0b1110_0000]);
    }

    #[test]
    fn test_two_bit_quantize_mean_vector() {
        let quantizer = MultiBitScalarQuantizer::new(ScalarQuantizationType::TwoBit).unwrap();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::TwoBit);
        let state = quantizer.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::TwoBit);
        quantizer
            .quantize(&[4.0, 5.0, 6.0], &state, &mut output)
            .unwrap();
        // Mean clears the low row (mean - std/3) and misses the high row.
        assert_eq!(output.quantized_vector(), &[0b1110_0000]);
    }

    #[test]
    fn test_four_bit_quantize_top_vector() {
        let quantizer = MultiBitScalarQuantizer::new(ScalarQuantizationType::FourBit).unwrap();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::FourBit);
        let state = quantizer.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::FourBit);
        quantizer
            .quantize(&[7.0, 8.0, 9.0], &state, &mut output)
            .unwrap();
        // Top training vector clears every threshold row in every dimension.
        assert_eq!(output.quantized_vector(), &[0xFF, 0xF0]);
    }

    #[test]
    fn test_one_bit_rejects_multi_bit_state() {
        let one_bit = OneBitScalarQuantizer::new();
        let multi = MultiBitScalarQuantizer::new(ScalarQuantizationType::TwoBit).unwrap();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::TwoBit);
        let state = multi.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        assert!(matches!(
            one_bit.quantize(&[1.0, 2.0, 3.0], &state, &mut output),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();

        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        assert!(matches!(
            quantizer.quantize(&[1.0, 2.0], &state, &mut output),
            Err(QuantizationError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_output_for_wrong_sub_type_rejected() {
        let quantizer = MultiBitScalarQuantizer::new(ScalarQuantizationType::FourBit).unwrap();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::FourBit);
        let state = quantizer.train(&mut request).unwrap();

        // A one-bit buffer holds ceil(d/8) bytes, a quarter of what the
        // four-bit encoding needs.
        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        assert!(matches!(
            quantizer.quantize(&[7.0, 8.0, 9.0], &state, &mut output),
            Err(QuantizationError::InvalidConfiguration(_))
        ));

        let one_bit = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = one_bit.train(&mut request).unwrap();
        let mut output = QuantizationOutput::new(ScalarQuantizationType::TwoBit);
        assert!(matches!(
            one_bit.quantize(&[7.0, 8.0, 9.0], &state, &mut output),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_multi_bit_requires_at_least_two_bits() {
        assert!(matches!(
            MultiBitScalarQuantizer::new(ScalarQuantizationType::OneBit),
            Err(QuantizationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rotation_trained_state_round_trips_through_quantize() {
        let quantizer = OneBitScalarQuantizer::new().with_rotation_seed(42);
        let vectors: Vec<Vec<f32>> = (0..32)
            .map(|i| (0..8).map(|d| ((i * 7 + d * 3) % 13) as f32 - 6.0).collect())
            .collect();
        let total = vectors.len();
        let mut request = TrainingRequest::new(
            move || vectors.clone().into_iter(),
            total,
            ScalarQuantizationParams::new(ScalarQuantizationType::OneBit).with_random_rotation(true),
        );
        let state = quantizer.train(&mut request).unwrap();
        assert!(state.rotation_matrix().is_some());

        let mut output = QuantizationOutput::new(ScalarQuantizationType::OneBit);
        quantizer
            .quantize(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0, -4.0], &state, &mut output)
            .unwrap();
        assert_eq!(output.quantized_vector().len(), 1);
    }

    #[test]
    fn test_adc_transform_centers_between_means() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();

        // below = {1, 2, 3}, above = {5.5, 6.5, 7.5}
        let mut query = [1.0f32, 6.5, 5.25];
        quantizer
            .transform_with_adc(&mut query, &state, Metric::InnerProduct)
            .unwrap();
        assert!((query[0] - 0.0).abs() < 1e-6); // at the below mean
        assert!((query[1] - 1.0).abs() < 1e-6); // at the above mean
        assert!((query[2] - 0.5).abs() < 1e-6); // midway
    }

    #[test]
    fn test_adc_l2_correction_scales_around_half() {
        let quantizer = OneBitScalarQuantizer::new();
        let mut request = request_for(training_vectors(), ScalarQuantizationType::OneBit);
        let state = quantizer.train(&mut request).unwrap();

        // Span above-below is 4.5 per dimension, correction = 4.5^2 = 20.25.
        let mut query = [6.0f32, 5.0, 6.0];
        let mut uncorrected = query;
        quantizer
            .transform_with_adc(&mut query, &state, Metric::L2)
            .unwrap();
        quantizer
            .transform_with_adc(&mut uncorrected, &state, Metric::InnerProduct)
            .unwrap();
        for (c, u) in query.iter().zip(uncorrected.iter()) {
            assert!((c - (20.25 * (u - 0.5) + 0.5)).abs() < 1e-4);
        }
    }
}
