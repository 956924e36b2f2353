//! Training population access.
//!
//! The host storage layer exposes vectors through a forward-only cursor, not
//! random access. [`TrainingRequest`] wraps a supplier of fresh cursors so a
//! quantizer can address vectors by position and re-scan the same logical
//! population across multiple training passes.

use crate::state::ScalarQuantizationParams;

/// Forward-only cursor over the vectors of one field.
///
/// Supplied by the host storage layer; the core never assumes random access.
pub trait VectorSource {
    /// Step the cursor and return the next vector, or `None` at end of data.
    fn next_vector(&mut self) -> Option<Vec<f32>>;
}

/// Blanket impl so plain iterators can serve as sources in tests and simple
/// hosts.
impl<I> VectorSource for I
where
    I: Iterator<Item = Vec<f32>>,
{
    fn next_vector(&mut self) -> Option<Vec<f32>> {
        self.next()
    }
}

/// Positional view over a forward-only vector population.
///
/// Positions requested through [`vector_at_position`](Self::vector_at_position)
/// are expected to be non-decreasing (samplers return ascending indices).
/// A request *behind* the cursor forces a fresh cursor from the supplier and
/// a re-scan from position zero, so out-of-order access is slow but never
/// returns the wrong vector.
pub struct TrainingRequest<'a> {
    supplier: Box<dyn Fn() -> Box<dyn VectorSource + 'a> + 'a>,
    cursor: Box<dyn VectorSource + 'a>,
    /// Number of cursor steps consumed since the last reset.
    steps_consumed: usize,
    total_vectors: usize,
    params: ScalarQuantizationParams,
}

impl<'a> TrainingRequest<'a> {
    /// Build a request from a supplier of fresh cursors and the live vector
    /// count for the field.
    pub fn new<F, S>(supplier: F, total_vectors: usize, params: ScalarQuantizationParams) -> Self
    where
        F: Fn() -> S + 'a,
        S: VectorSource + 'a,
    {
        let supplier: Box<dyn Fn() -> Box<dyn VectorSource + 'a> + 'a> =
            Box::new(move || Box::new(supplier()));
        let cursor = supplier();
        Self {
            supplier,
            cursor,
            steps_consumed: 0,
            total_vectors,
            params,
        }
    }

    /// Total number of vectors in the population.
    pub fn total_vectors(&self) -> usize {
        self.total_vectors
    }

    /// Parameters this training run is for.
    pub fn params(&self) -> &ScalarQuantizationParams {
        &self.params
    }

    /// Return the vector at `position`, or `None` if the source is exhausted
    /// before reaching it.
    ///
    /// Advances the cursor forward; a position behind the cursor triggers an
    /// internal [`reset`](Self::reset) and re-scan.
    pub fn vector_at_position(&mut self, position: usize) -> Option<Vec<f32>> {
        if position < self.steps_consumed {
            self.reset();
        }
        let mut vector = None;
        while self.steps_consumed <= position {
            vector = self.cursor.next_vector();
            self.steps_consumed += 1;
            vector.as_ref()?;
        }
        vector
    }

    /// Re-acquire a fresh cursor from the supplier and zero the step counter.
    ///
    /// Called before each training pass so the same logical population can be
    /// scanned deterministically more than once.
    pub fn reset(&mut self) {
        self.cursor = (self.supplier)();
        self.steps_consumed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ScalarQuantizationParams, ScalarQuantizationType};

    fn request_over(vectors: Vec<Vec<f32>>) -> TrainingRequest<'static> {
        let total = vectors.len();
        TrainingRequest::new(
            move || vectors.clone().into_iter(),
            total,
            ScalarQuantizationParams::new(ScalarQuantizationType::OneBit),
        )
    }

    #[test]
    fn test_forward_access_by_position() {
        let mut request = request_over(vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(request.vector_at_position(0), Some(vec![1.0]));
        assert_eq!(request.vector_at_position(2), Some(vec![3.0]));
    }

    #[test]
    fn test_skipping_positions() {
        let mut request = request_over(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]);
        assert_eq!(request.vector_at_position(1), Some(vec![2.0]));
        assert_eq!(request.vector_at_position(3), Some(vec![4.0]));
    }

    #[test]
    fn test_exhausted_source_returns_none() {
        let mut request = request_over(vec![vec![1.0]]);
        assert_eq!(request.vector_at_position(5), None);
    }

    #[test]
    fn test_reset_rescans_from_start() {
        let mut request = request_over(vec![vec![1.0], vec![2.0]]);
        assert_eq!(request.vector_at_position(1), Some(vec![2.0]));
        request.reset();
        assert_eq!(request.vector_at_position(0), Some(vec![1.0]));
    }

    #[test]
    fn test_backward_access_forces_reset() {
        let mut request = request_over(vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(request.vector_at_position(2), Some(vec![3.0]));
        // Behind the cursor: must re-scan, not return garbage.
        assert_eq!(request.vector_at_position(0), Some(vec![1.0]));
        assert_eq!(request.vector_at_position(1), Some(vec![2.0]));
    }
}
