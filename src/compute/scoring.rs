//! Scoring ("structure") functions mapping domain points to observations.
//!
//! Every function is pure: the same point always produces the same
//! observation. Randomness belongs to the generators, never here.

use std::f64::consts::{SQRT_2, TAU};

use crate::schema::{Observation, StructureFunction};

/// A deterministic map from a domain point to a 2D observation.
pub trait ScoringFunction: Send + Sync {
    /// Score one domain point.
    fn score(&self, point: &[f64]) -> Observation;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Build the scoring function named by the configuration.
pub fn scoring_function(structure: &StructureFunction) -> Box<dyn ScoringFunction> {
    match *structure {
        StructureFunction::Z12 => Box::new(Z12),
        StructureFunction::Donut {
            inner_radius,
            outer_radius,
        } => Box::new(Donut {
            inner_radius,
            outer_radius,
        }),
        StructureFunction::InverseDonut {
            inner_radius,
            outer_radius,
        } => Box::new(InverseDonut {
            inner_radius,
            outer_radius,
        }),
        StructureFunction::MeanOfSubsets => Box::new(MeanOfSubsets),
        StructureFunction::GaussianNorm { center, sigma } => {
            Box::new(GaussianNorm { center, sigma })
        }
    }
}

/// `((x + y) / 2, z^12)`: the second axis is crowded near zero, so its upper
/// bins are hard to reach.
#[derive(Debug, Clone, Copy)]
pub struct Z12;

impl ScoringFunction for Z12 {
    fn score(&self, point: &[f64]) -> Observation {
        Observation::new((point[0] + point[1]) / 2.0, point[2].powi(12))
    }

    fn name(&self) -> &'static str {
        "z12"
    }
}

/// Observations on an annulus around (0.5, 0.5).
///
/// The first half of the coordinates sets the angle, the second half the
/// radius within `[inner_radius, outer_radius]` (in units of half the
/// observation square).
#[derive(Debug, Clone, Copy)]
pub struct Donut {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl ScoringFunction for Donut {
    fn score(&self, point: &[f64]) -> Observation {
        let (a, b) = split_means(point);
        let radius = self.inner_radius + (self.outer_radius - self.inner_radius) * b;
        polar(a * TAU, radius)
    }

    fn name(&self) -> &'static str {
        "donut"
    }
}

/// Observations everywhere except the annulus a [`Donut`] with the same radii
/// would cover: the inner disk and the region beyond the outer radius.
#[derive(Debug, Clone, Copy)]
pub struct InverseDonut {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl ScoringFunction for InverseDonut {
    fn score(&self, point: &[f64]) -> Observation {
        let (a, b) = split_means(point);
        let radius = if b < 0.5 {
            self.inner_radius * 2.0 * b
        } else {
            self.outer_radius + (SQRT_2 - self.outer_radius) * (2.0 * b - 1.0)
        };
        polar(a * TAU, radius)
    }

    fn name(&self) -> &'static str {
        "inverse_donut"
    }
}

/// Mean of the first `ceil(d / 2)` coordinates against the mean of the rest.
#[derive(Debug, Clone, Copy)]
pub struct MeanOfSubsets;

impl ScoringFunction for MeanOfSubsets {
    fn score(&self, point: &[f64]) -> Observation {
        let (a, b) = split_means(point);
        Observation::new(a, b)
    }

    fn name(&self) -> &'static str {
        "mean_of_subsets"
    }
}

/// `(|p| / sqrt(d), exp(-|p - c|^2 / (2 sigma^2 d)))` with `c` the constant
/// vector `center`.
#[derive(Debug, Clone, Copy)]
pub struct GaussianNorm {
    pub center: f64,
    pub sigma: f64,
}

impl ScoringFunction for GaussianNorm {
    fn score(&self, point: &[f64]) -> Observation {
        let d = point.len().max(1) as f64;
        let norm = point.iter().map(|v| v * v).sum::<f64>().sqrt() / d.sqrt();
        let dist2 = point.iter().map(|v| (v - self.center).powi(2)).sum::<f64>();
        let gauss = (-dist2 / (2.0 * self.sigma * self.sigma * d)).exp();
        Observation::new(norm, gauss)
    }

    fn name(&self) -> &'static str {
        "gaussian_norm"
    }
}

/// Means of the first `ceil(d / 2)` coordinates and of the remainder.
fn split_means(point: &[f64]) -> (f64, f64) {
    let split = point.len().div_ceil(2);
    (mean(&point[..split]), mean(&point[split..]))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Point at `angle` and `radius` around (0.5, 0.5), clamped into the unit
/// square.
fn polar(angle: f64, radius: f64) -> Observation {
    Observation::new(
        (0.5 + 0.5 * radius * angle.cos()).clamp(0.0, 1.0),
        (0.5 + 0.5 * radius * angle.sin()).clamp(0.0, 1.0),
    )
}
