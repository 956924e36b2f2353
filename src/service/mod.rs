//! Quantization facade for the host's composition root.
//!
//! Owns the quantizer registry and the per-field state cache and wires the
//! training and encoding paths together. Explicitly constructed and passed
//! by handle to the indexing and search code paths; this crate has no
//! global instance.

use crate::cache::QuantizationStateCache;
use crate::error::QuantizationResult;
use crate::output::QuantizationOutput;
use crate::quantizer::Metric;
use crate::registry::QuantizerRegistry;
use crate::state::{QuantizationState, ScalarQuantizationParams};
use crate::training::{TrainingRequest, VectorSource};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Training, encoding, and state-lifecycle entry point.
pub struct QuantizationService {
    registry: QuantizerRegistry,
    cache: QuantizationStateCache,
}

impl QuantizationService {
    /// Service backed by the default scalar quantizer registry.
    pub fn new() -> Self {
        Self::with_registry(QuantizerRegistry::with_defaults())
    }

    /// Service backed by a host-assembled registry.
    pub fn with_registry(registry: QuantizerRegistry) -> Self {
        Self {
            registry,
            cache: QuantizationStateCache::new(),
        }
    }

    /// The per-field state cache.
    pub fn cache(&self) -> &QuantizationStateCache {
        &self.cache
    }

    /// Train a quantizer over a vector population.
    ///
    /// `supplier` must return a fresh forward-only cursor over the same
    /// logical population on every call; training scans it more than once.
    pub fn train<'a, F, S>(
        &self,
        params: ScalarQuantizationParams,
        supplier: F,
        total_vectors: usize,
    ) -> QuantizationResult<QuantizationState>
    where
        F: Fn() -> S + 'a,
        S: VectorSource + 'a,
    {
        let quantizer = self.registry.quantizer_for(&params)?;
        let mut request = TrainingRequest::new(supplier, total_vectors, params);
        quantizer.train(&mut request)
    }

    /// Train and publish the state for a field, replacing any prior state.
    pub fn train_field<'a, F, S>(
        &self,
        field: &str,
        params: ScalarQuantizationParams,
        supplier: F,
        total_vectors: usize,
    ) -> QuantizationResult<Arc<QuantizationState>>
    where
        F: Fn() -> S + 'a,
        S: VectorSource + 'a,
    {
        let state = self.train(params, supplier, total_vectors)?;
        debug!(field, total_vectors, "trained quantization state for field");
        Ok(self.cache.add(field, state))
    }

    /// Encode one vector against a trained state into a caller-owned output
    /// buffer. Safe to call concurrently with one buffer per caller.
    pub fn quantize(
        &self,
        state: &QuantizationState,
        vector: &[f32],
        output: &mut QuantizationOutput,
    ) -> QuantizationResult<()> {
        let quantizer = self.registry.quantizer_for(state.params())?;
        quantizer.quantize(vector, state, output)
    }

    /// Encode a batch of vectors in parallel, one scratch buffer per worker.
    pub fn quantize_batch(
        &self,
        state: &QuantizationState,
        vectors: &[Vec<f32>],
    ) -> QuantizationResult<Vec<Vec<u8>>> {
        let quantizer = self.registry.quantizer_for(state.params())?;
        let sq_type = state.params().sq_type;
        vectors
            .par_iter()
            .map_init(
                || QuantizationOutput::new(sq_type),
                |output, vector| {
                    quantizer.quantize(vector, state, output)?;
                    Ok(output.quantized_vector().to_vec())
                },
            )
            .collect()
    }

    /// Rescale a full-precision query into the quantized space for
    /// asymmetric scoring against bit-packed document vectors.
    pub fn transform_with_adc(
        &self,
        state: &QuantizationState,
        vector: &mut [f32],
        metric: Metric,
    ) -> QuantizationResult<()> {
        let quantizer = self.registry.quantizer_for(state.params())?;
        quantizer.transform_with_adc(vector, state, metric)
    }

    /// A scratch output buffer sized for the given parameters.
    pub fn create_output(&self, params: &ScalarQuantizationParams) -> QuantizationOutput {
        QuantizationOutput::new(params.sq_type)
    }
}

impl Default for QuantizationService {
    fn default() -> Self {
        Self::new()
    }
}
