//! Per-field cache of trained quantization states.
//!
//! Shared, long-lived process state: training writes, indexing and search
//! read concurrently. States are immutable once trained, so readers get a
//! cheap `Arc` clone and always observe either the old or the new state for
//! a field, never a torn write. The cache never expires entries on its own;
//! the host evicts when a field or index is dropped.

use crate::state::QuantizationState;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe map from field name to trained quantization state.
///
/// At most one live state per field; `add` silently replaces.
#[derive(Default)]
pub struct QuantizationStateCache {
    states: RwLock<HashMap<String, Arc<QuantizationState>>>,
}

impl QuantizationStateCache {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Store the state for a field, replacing any prior entry.
    pub fn add(&self, field: &str, state: QuantizationState) -> Arc<QuantizationState> {
        let state = Arc::new(state);
        self.states
            .write()
            .insert(field.to_string(), Arc::clone(&state));
        tracing::debug!(field, "cached quantization state");
        state
    }

    /// The state for a field, if one has been trained.
    pub fn get(&self, field: &str) -> Option<Arc<QuantizationState>> {
        self.states.read().get(field).cloned()
    }

    /// Remove a field's state. No-op if absent.
    pub fn evict(&self, field: &str) {
        if self.states.write().remove(field).is_some() {
            tracing::debug!(field, "evicted quantization state");
        }
    }

    /// Remove every cached state.
    pub fn clear(&self) {
        self.states.write().clear();
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        OneBitScalarQuantizationState, ScalarQuantizationParams, ScalarQuantizationType,
    };

    fn state(thresholds: Vec<f32>) -> QuantizationState {
        QuantizationState::OneBit(OneBitScalarQuantizationState {
            params: ScalarQuantizationParams::new(ScalarQuantizationType::OneBit),
            mean_thresholds: thresholds,
            below_threshold_means: None,
            above_threshold_means: None,
            average_l2_l1_ratio: None,
            rotation_matrix: None,
        })
    }

    #[test]
    fn test_add_then_get() {
        let cache = QuantizationStateCache::new();
        let added = cache.add("field_a", state(vec![1.0, 2.0]));
        let fetched = cache.get("field_a").unwrap();
        assert!(Arc::ptr_eq(&added, &fetched));
    }

    #[test]
    fn test_add_replaces_prior_entry() {
        let cache = QuantizationStateCache::new();
        cache.add("field_a", state(vec![1.0]));
        cache.add("field_a", state(vec![2.0]));
        assert_eq!(cache.len(), 1);
        match cache.get("field_a").unwrap().as_ref() {
            QuantizationState::OneBit(s) => assert_eq!(s.mean_thresholds, vec![2.0]),
            _ => panic!("expected one-bit state"),
        }
    }

    #[test]
    fn test_evict() {
        let cache = QuantizationStateCache::new();
        cache.add("field_a", state(vec![1.0]));
        cache.evict("field_a");
        assert!(cache.get("field_a").is_none());
        // Evicting an absent field is a no-op.
        cache.evict("field_a");
    }

    #[test]
    fn test_clear() {
        let cache = QuantizationStateCache::new();
        cache.add("field_a", state(vec![1.0]));
        cache.add("field_b", state(vec![2.0]));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let cache = Arc::new(QuantizationStateCache::new());
        cache.add("field", state(vec![0.0]));

        let mut handles = Vec::new();
        for i in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for j in 0..100 {
                    if i == 0 {
                        cache.add("field", state(vec![j as f32]));
                    } else {
                        // Readers must always see a complete state.
                        let current = cache.get("field").unwrap();
                        assert_eq!(current.dimension(), 1);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
