//! Parent selection strategies.
//!
//! All strategies sample with replacement and return indices into the
//! observation set the triangulation (or bin assignment) was built from.

use std::collections::BTreeMap;

use log::debug;

use super::geometry::Triangulation;
use super::rng::ExplorerRng;
use crate::schema::{Bin, SelectionConfig};

/// Parent selection over a triangulation, blending hull-edge weighting with
/// largest-simplex weighting.
#[derive(Debug, Clone)]
pub struct ParentSelector {
    fraction_hull: f64,
    best_triangles: usize,
}

impl ParentSelector {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            fraction_hull: config.fraction_hull,
            best_triangles: config.best_triangles,
        }
    }

    /// Draw `num_parents` parents.
    ///
    /// `round(fraction_hull * num_parents)` come from the hull, the rest from
    /// the largest simplices, hull draws first.
    pub fn select(
        &self,
        triangulation: &Triangulation,
        num_parents: usize,
        rng: &mut ExplorerRng,
    ) -> Vec<usize> {
        let from_hull = ((self.fraction_hull * num_parents as f64).round() as usize).min(num_parents);
        let from_simplices = num_parents - from_hull;
        debug!("selecting {from_hull} hull parents and {from_simplices} simplex parents");

        let mut parents = hull_parents(triangulation, from_hull, rng);
        parents.extend(simplex_parents(
            triangulation,
            from_simplices,
            self.best_triangles,
            rng,
        ));
        parents
    }
}

/// Hull vertices weighted by the summed length of their incident hull edges.
pub fn hull_weights(triangulation: &Triangulation) -> BTreeMap<usize, f64> {
    let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
    for &edge in triangulation.hull_edges() {
        let length = triangulation.edge_length(edge);
        *weights.entry(edge.0).or_insert(0.0) += length;
        *weights.entry(edge.1).or_insert(0.0) += length;
    }
    weights
}

/// Draw `count` hull vertices, each with probability proportional to the
/// length of hull boundary it touches.
pub fn hull_parents(
    triangulation: &Triangulation,
    count: usize,
    rng: &mut ExplorerRng,
) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let (vertices, weights): (Vec<usize>, Vec<f64>) =
        hull_weights(triangulation).into_iter().unzip();
    rng.weighted_indices(&weights, count)
        .into_iter()
        .map(|i| vertices[i])
        .collect()
}

/// Draw `count` parents from the `best` largest triangles: a triangle with
/// probability proportional to its area, then one of its corners uniformly.
pub fn simplex_parents(
    triangulation: &Triangulation,
    count: usize,
    best: usize,
    rng: &mut ExplorerRng,
) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(f64, [usize; 3])> = triangulation
        .simplices()
        .iter()
        .map(|s| (triangulation.simplex_area(s), *s))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(best.max(1));

    let weights: Vec<f64> = ranked.iter().map(|(area, _)| area.max(0.0)).collect();
    rng.weighted_indices(&weights, count)
        .into_iter()
        .map(|i| ranked[i].1[rng.index(3)])
        .collect()
}

/// Draw `count` parents biased toward sparsely populated bins.
///
/// `assignments` holds the bin of each candidate box. Every occupied bin gets
/// weight `total / count_in_bin`; a bin is drawn by weight, then a box
/// uniformly from it.
pub fn rare_bin_parents(assignments: &[Bin], count: usize, rng: &mut ExplorerRng) -> Vec<usize> {
    if count == 0 || assignments.is_empty() {
        return Vec::new();
    }
    let mut members: BTreeMap<Bin, Vec<usize>> = BTreeMap::new();
    for (index, bin) in assignments.iter().enumerate() {
        members.entry(*bin).or_default().push(index);
    }
    let total = assignments.len() as f64;
    let groups: Vec<&Vec<usize>> = members.values().collect();
    let weights: Vec<f64> = groups.iter().map(|g| total / g.len() as f64).collect();

    rng.weighted_indices(&weights, count)
        .into_iter()
        .map(|g| {
            let group = groups[g];
            group[rng.index(group.len())]
        })
        .collect()
}
