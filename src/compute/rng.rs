//! Random source threaded through seeding, selection and mutation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;

/// Random number generator wrapper for exploration operations.
pub struct ExplorerRng {
    rng: StdRng,
}

impl ExplorerRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create from an optional seed, falling back to entropy.
    pub fn from_optional(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }

    /// Uniform draw from [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// +1.0 or -1.0 with equal probability.
    #[inline]
    pub fn sign(&mut self) -> f64 {
        if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Fair coin.
    #[inline]
    pub fn coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform point in [0, 1)^dimensions.
    pub fn unit_point(&mut self, dimensions: usize) -> Vec<f64> {
        (0..dimensions).map(|_| self.unit()).collect()
    }

    /// `count` distinct indices from `0..len`, in random order.
    pub fn distinct_indices(&mut self, len: usize, count: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, count.min(len)).into_vec()
    }

    /// `count` independent draws (with replacement), each with probability
    /// proportional to `weights`.
    ///
    /// Falls back to uniform draws when the weights cannot form a
    /// distribution (all zero, negative or non-finite). `weights` must be
    /// non-empty.
    pub fn weighted_indices(&mut self, weights: &[f64], count: usize) -> Vec<usize> {
        match WeightedIndex::new(weights) {
            Ok(dist) => (0..count).map(|_| dist.sample(&mut self.rng)).collect(),
            Err(_) => (0..count).map(|_| self.index(weights.len())).collect(),
        }
    }
}
