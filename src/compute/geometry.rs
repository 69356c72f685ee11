//! Delaunay triangulation of the observation-point set.
//!
//! A [`Triangulation`] is always built from scratch over the full point set;
//! it is never patched incrementally. Indices it reports refer to positions
//! in the slice it was built from.
//!
//! Duplicate observations collapse onto one triangulation vertex. That
//! vertex is reported under the index of the first point at that position.

use spade::{DelaunayTriangulation, InsertionError, Point2, Triangulation as _};

use crate::schema::Observation;

/// Triangulation of a 2D point set with hull edges and simplices.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<Observation>,
    hull_edges: Vec<(usize, usize)>,
    simplices: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulate `points`.
    ///
    /// Fails on fewer than three distinct points, on an all-collinear set,
    /// and on non-finite coordinates.
    pub fn new(points: &[Observation]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                count: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite { index });
        }

        let mut dt: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        // Triangulation vertex index -> first point index at that position.
        let mut vertex_to_point: Vec<usize> = Vec::with_capacity(points.len());

        for (index, p) in points.iter().enumerate() {
            let before = dt.num_vertices();
            dt.insert(Point2::new(p.x, p.y))
                .map_err(|reason| GeometryError::Insertion { index, reason })?;
            if dt.num_vertices() > before {
                vertex_to_point.push(index);
            }
        }

        if dt.num_vertices() < 3 {
            return Err(GeometryError::TooFewPoints {
                count: dt.num_vertices(),
            });
        }
        if dt.num_inner_faces() == 0 {
            return Err(GeometryError::Collinear {
                count: dt.num_vertices(),
            });
        }

        let hull_edges = dt
            .convex_hull()
            .map(|edge| {
                (
                    vertex_to_point[edge.from().fix().index()],
                    vertex_to_point[edge.to().fix().index()],
                )
            })
            .collect();

        let simplices = dt
            .inner_faces()
            .map(|face| {
                let [a, b, c] = face.vertices();
                [
                    vertex_to_point[a.fix().index()],
                    vertex_to_point[b.fix().index()],
                    vertex_to_point[c.fix().index()],
                ]
            })
            .collect();

        Ok(Self {
            points: points.to_vec(),
            hull_edges,
            simplices,
        })
    }

    /// Points the triangulation was built from.
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    /// Boundary edges of the convex hull, as point index pairs.
    pub fn hull_edges(&self) -> &[(usize, usize)] {
        &self.hull_edges
    }

    /// Sorted, deduplicated indices of points on the hull.
    pub fn hull_vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<usize> = self
            .hull_edges
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }

    /// Triangles as point index triples, counter-clockwise.
    pub fn simplices(&self) -> &[[usize; 3]] {
        &self.simplices
    }

    /// Edges of every triangle, each undirected edge reported once.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .simplices
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Signed area of a triangle (positive for counter-clockwise order).
    pub fn simplex_area(&self, simplex: &[usize; 3]) -> f64 {
        signed_area(
            &self.points[simplex[0]],
            &self.points[simplex[1]],
            &self.points[simplex[2]],
        )
    }

    /// Signed area of every simplex, parallel to [`Self::simplices`].
    pub fn simplex_areas(&self) -> Vec<f64> {
        self.simplices.iter().map(|s| self.simplex_area(s)).collect()
    }

    /// Length of a hull edge.
    pub fn edge_length(&self, (a, b): (usize, usize)) -> f64 {
        self.points[a].distance(&self.points[b])
    }
}

/// Signed area of triangle `abc`.
#[inline]
pub fn signed_area(a: &Observation, b: &Observation, c: &Observation) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

/// Triangulation failures. All are fatal for the generation that hit them.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Cannot triangulate {count} distinct points; at least 3 are required")]
    TooFewPoints { count: usize },
    #[error("All {count} distinct points are collinear; no triangle can be formed")]
    Collinear { count: usize },
    #[error("Observation {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("Failed to insert observation {index}: {reason:?}")]
    Insertion {
        index: usize,
        reason: InsertionError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(points: &[(f64, f64)]) -> Vec<Observation> {
        points.iter().copied().map(Observation::from).collect()
    }

    #[test]
    fn test_square_with_center() {
        let points = obs(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (0.5, 0.4)]);
        let tri = Triangulation::new(&points).unwrap();

        assert_eq!(tri.hull_vertices(), vec![0, 1, 2, 3]);
        assert_eq!(tri.hull_edges().len(), 4);
        assert_eq!(tri.simplices().len(), 4);

        let total: f64 = tri.simplex_areas().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(tri.simplex_areas().iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_hull_perimeter() {
        let points = obs(&[(0.0, 0.0), (2.0, 0.0), (0.0, 1.0)]);
        let tri = Triangulation::new(&points).unwrap();
        let perimeter: f64 = tri.hull_edges().iter().map(|&e| tri.edge_length(e)).sum();
        assert!((perimeter - (3.0 + 5f64.sqrt())).abs() < 1e-12);
        assert_eq!(tri.edges().len(), 3);
    }

    #[test]
    fn test_duplicates_map_to_first_index() {
        let points = obs(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let tri = Triangulation::new(&points).unwrap();
        assert_eq!(tri.hull_vertices(), vec![0, 1, 2]);
        assert_eq!(tri.simplices().len(), 1);
    }

    #[test]
    fn test_too_few_points() {
        let points = obs(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(
            Triangulation::new(&points),
            Err(GeometryError::TooFewPoints { count: 2 })
        ));
    }

    #[test]
    fn test_too_few_distinct_points() {
        let points = obs(&[(0.0, 0.0), (1.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(matches!(
            Triangulation::new(&points),
            Err(GeometryError::TooFewPoints { count: 2 })
        ));
    }

    #[test]
    fn test_collinear_points() {
        let points = obs(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (0.25, 0.25)]);
        assert!(matches!(
            Triangulation::new(&points),
            Err(GeometryError::Collinear { count: 4 })
        ));
    }

    #[test]
    fn test_non_finite_point() {
        let points = obs(&[(0.0, 0.0), (1.0, 0.0), (f64::NAN, 1.0)]);
        assert!(matches!(
            Triangulation::new(&points),
            Err(GeometryError::NonFinite { index: 2 })
        ));
    }

    #[test]
    fn test_signed_area_orientation() {
        let a = Observation::new(0.0, 0.0);
        let b = Observation::new(1.0, 0.0);
        let c = Observation::new(0.0, 1.0);
        assert!((signed_area(&a, &b, &c) - 0.5).abs() < 1e-12);
        assert!((signed_area(&a, &c, &b) + 0.5).abs() < 1e-12);
    }
}
