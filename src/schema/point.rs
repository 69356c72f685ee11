//! Plain data types for domain points, observations, bins and boxes.

use serde::{Deserialize, Serialize};

/// Image of a domain point in the 2D observation space.
///
/// Components are conventionally normalized to [0, 1], but nothing enforces
/// it: binning clamps whatever comes in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

impl Observation {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another observation.
    #[inline]
    pub fn distance(&self, other: &Observation) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Observation {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A grid cell in discretized observation space.
///
/// Only meaningful together with the bin count it was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bin {
    pub i: usize,
    pub j: usize,
}

impl Bin {
    #[inline]
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

impl From<(usize, usize)> for Bin {
    fn from((i, j): (usize, usize)) -> Self {
        Self { i, j }
    }
}

/// One scored member of the population.
///
/// Created once, after scoring, and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Position in the population (also its identifier).
    pub id: usize,
    /// Generation the box was created in (0 = seed).
    pub generation: usize,
    /// Box this one was mutated from, if any.
    pub parent: Option<usize>,
    /// Domain point. Usually in [0, 1]^d, but the weighted mutation policy
    /// can step outside.
    pub point: Vec<f64>,
    /// Scored observation.
    pub observation: Observation,
}

/// An unscored child produced by a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub point: Vec<f64>,
    pub parent: Option<usize>,
}

impl Candidate {
    pub fn seed(point: Vec<f64>) -> Self {
        Self {
            point,
            parent: None,
        }
    }

    pub fn child_of(parent: usize, point: Vec<f64>) -> Self {
        Self {
            point,
            parent: Some(parent),
        }
    }
}
