//! Training-set sampling.
//!
//! Training a quantizer over every vector in a large segment is wasteful;
//! a bounded, unbiased subset is enough to estimate per-dimension statistics.
//! The population is only reachable through a forward cursor, so sampling
//! must be single-pass.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Strategy for selecting training vector positions.
pub trait Sampler: Send + Sync {
    /// Select `min(total, sample_size)` distinct positions in `[0, total)`,
    /// returned in ascending order so consumers can scan sequentially.
    fn sample(&self, total: usize, sample_size: usize) -> Vec<u32>;
}

/// Available sampler implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    Reservoir,
}

/// Create a sampler for the given kind.
pub fn create_sampler(kind: SamplerKind) -> Box<dyn Sampler> {
    match kind {
        SamplerKind::Reservoir => Box::new(ReservoirSampler::new()),
    }
}

/// Single-pass reservoir sampler.
///
/// Classic algorithm R: fill the reservoir with the first `sample_size`
/// positions, then for each later position `i` draw `j` uniformly from
/// `[0, i]` and overwrite slot `j` when `j < sample_size`. Every position
/// ends up in the sample with equal probability without knowing `total`
/// in advance.
pub struct ReservoirSampler {
    seed: Option<u64>,
}

impl ReservoirSampler {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Sampler with a fixed seed, for reproducible training runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for ReservoirSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for ReservoirSampler {
    fn sample(&self, total: usize, sample_size: usize) -> Vec<u32> {
        if total == 0 || sample_size == 0 {
            return Vec::new();
        }
        if total <= sample_size {
            return (0..total as u32).collect();
        }

        let mut reservoir: Vec<u32> = (0..sample_size as u32).collect();
        let mut rng = self.rng();
        for i in sample_size..total {
            let j = rng.gen_range(0..=i);
            if j < sample_size {
                reservoir[j] = i as u32;
            }
        }
        reservoir.sort_unstable();
        reservoir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_population_when_small() {
        let sampler = ReservoirSampler::new();
        let sample = sampler.sample(10, 25);
        assert_eq!(sample, (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_exact_sample_size() {
        let sampler = ReservoirSampler::with_seed(42);
        let sample = sampler.sample(10_000, 100);
        assert_eq!(sample.len(), 100);
    }

    #[test]
    fn test_sorted_distinct_in_range() {
        let sampler = ReservoirSampler::with_seed(7);
        let sample = sampler.sample(5_000, 500);
        assert!(sample.windows(2).all(|w| w[0] < w[1]));
        assert!(sample.iter().all(|&i| (i as usize) < 5_000));
    }

    #[test]
    fn test_empty_inputs() {
        let sampler = ReservoirSampler::new();
        assert!(sampler.sample(0, 100).is_empty());
        assert!(sampler.sample(100, 0).is_empty());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = ReservoirSampler::with_seed(123).sample(1_000, 64);
        let b = ReservoirSampler::with_seed(123).sample(1_000, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_factory() {
        let sampler = create_sampler(SamplerKind::Reservoir);
        assert_eq!(sampler.sample(3, 8), vec![0, 1, 2]);
    }
}
