//! Triangulation plots rendered with plotters.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::compute::{BinGrid, Triangulation};
use crate::schema::{Bin, Observation};

const OCCUPIED: RGBColor = RGBColor(215, 215, 215);
const NEW_BIN: RGBColor = RGBColor(0, 150, 140);
const PARENT: RGBColor = RGBColor(255, 140, 0);
const CHILD: RGBColor = RGBColor(30, 160, 60);

/// Everything known about one generation that a plot may show.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub generation: usize,
    /// Every observation so far, indexed by box id.
    pub observations: &'a [Observation],
    /// Triangulation the parents were selected from, when there was one.
    pub triangulation: Option<&'a Triangulation>,
    pub grid: BinGrid,
    /// Ids of the boxes created this generation.
    pub children: &'a [usize],
    /// Parent id of every child, repeated once per draw.
    pub parents: &'a [usize],
    pub occupied: &'a BTreeSet<Bin>,
    pub new_bins: &'a BTreeSet<Bin>,
}

/// Consumer of per-generation frames.
pub trait Visualizer: Send {
    /// Render one frame. Returns the written file, if any.
    fn render(&mut self, frame: &Frame<'_>) -> Result<Option<PathBuf>, RenderError>;
}

/// Writes `triplot_<generation>.svg` files into a directory.
#[derive(Debug, Clone)]
pub struct SvgPlotter {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl SvgPlotter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, RenderError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(|source| RenderError::Io {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self {
            output_dir,
            size: (800, 800),
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn draw(&self, path: &Path, frame: &Frame<'_>) -> Result<(), RenderError> {
        let grid = frame.grid;
        let (x0, x1) = grid.x_bounds;
        let (y0, y1) = grid.y_bounds;
        let dx = (x1 - x0) / grid.bins as f64;
        let dy = (y1 - y0) / grid.bins as f64;
        let cell = |bin: &Bin| {
            [
                (x0 + bin.i as f64 * dx, y0 + bin.j as f64 * dy),
                (x0 + (bin.i + 1) as f64 * dx, y0 + (bin.j + 1) as f64 * dy),
            ]
        };
        let point = |id: usize| frame.observations.get(id).map(|o| (o.x, o.y));

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(draw_error)?;

        // Bins: old occupied grey, newly occupied teal.
        chart
            .draw_series(
                frame
                    .occupied
                    .iter()
                    .filter(|b| !frame.new_bins.contains(b))
                    .map(|b| Rectangle::new(cell(b), OCCUPIED.filled())),
            )
            .map_err(draw_error)?;
        chart
            .draw_series(
                frame
                    .new_bins
                    .iter()
                    .map(|b| Rectangle::new(cell(b), NEW_BIN.mix(0.6).filled())),
            )
            .map_err(draw_error)?;

        // Grid lines.
        chart
            .draw_series((0..=grid.bins).flat_map(|k| {
                let x = x0 + k as f64 * dx;
                let y = y0 + k as f64 * dy;
                [
                    PathElement::new(vec![(x, y0), (x, y1)], BLACK.mix(0.15)),
                    PathElement::new(vec![(x0, y), (x1, y)], BLACK.mix(0.15)),
                ]
            }))
            .map_err(draw_error)?;

        if let Some(tri) = frame.triangulation {
            let pts = tri.points();
            chart
                .draw_series(tri.edges().into_iter().map(|(a, b)| {
                    PathElement::new(
                        vec![(pts[a].x, pts[a].y), (pts[b].x, pts[b].y)],
                        BLUE.mix(0.25),
                    )
                }))
                .map_err(draw_error)?;
            chart
                .draw_series(
                    tri.hull_vertices()
                        .into_iter()
                        .map(|v| Circle::new((pts[v].x, pts[v].y), 4, RED.stroke_width(1))),
                )
                .map_err(draw_error)?;
        }

        chart
            .draw_series(
                frame
                    .observations
                    .iter()
                    .map(|o| Circle::new((o.x, o.y), 1, BLACK.mix(0.5).filled())),
            )
            .map_err(draw_error)?;

        chart
            .draw_series(
                frame
                    .children
                    .iter()
                    .filter_map(|&id| point(id))
                    .map(|p| Circle::new(p, 2, CHILD.filled())),
            )
            .map_err(draw_error)?;

        let mut draws: BTreeMap<usize, u32> = BTreeMap::new();
        for &parent in frame.parents {
            *draws.entry(parent).or_insert(0) += 1;
        }
        chart
            .draw_series(draws.into_iter().filter_map(|(id, count)| {
                point(id).map(|p| Circle::new(p, (2 + count).min(12), PARENT.mix(0.8).filled()))
            }))
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
        Ok(())
    }
}

impl Visualizer for SvgPlotter {
    fn render(&mut self, frame: &Frame<'_>) -> Result<Option<PathBuf>, RenderError> {
        let path = self
            .output_dir
            .join(format!("triplot_{:05}.svg", frame.generation));
        self.draw(&path, frame)?;
        Ok(Some(path))
    }
}

fn draw_error<E: std::error::Error + Send + Sync>(error: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(error.to_string())
}

/// Plot rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Drawing failed: {0}")]
    Draw(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_written() {
        let dir = tempfile::tempdir().unwrap();
        let observations: Vec<Observation> =
            [(0.1, 0.1), (0.9, 0.1), (0.5, 0.9), (0.5, 0.4), (0.6, 0.5)]
                .into_iter()
                .map(Observation::from)
                .collect();
        let tri = Triangulation::new(&observations[..4]).unwrap();
        let grid = BinGrid::unit(4);
        let occupied: BTreeSet<Bin> = observations.iter().map(|o| grid.bin_of(o)).collect();
        let new_bins = BTreeSet::from([grid.bin_of(&observations[4])]);

        let mut plotter = SvgPlotter::new(dir.path().join("plots"))
            .unwrap()
            .with_size(200, 200);
        let frame = Frame {
            generation: 3,
            observations: &observations,
            triangulation: Some(&tri),
            grid,
            children: &[4],
            parents: &[3, 3],
            occupied: &occupied,
            new_bins: &new_bins,
        };
        let path = plotter.render(&frame).unwrap().unwrap();
        assert!(path.ends_with("triplot_00003.svg"));
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("circle"));
    }

    #[test]
    fn test_frame_without_triangulation() {
        let dir = tempfile::tempdir().unwrap();
        let observations = vec![Observation::new(0.2, 0.3)];
        let occupied = BTreeSet::from([Bin::new(0, 1)]);
        let mut plotter = SvgPlotter::new(dir.path()).unwrap().with_size(100, 100);
        let frame = Frame {
            generation: 0,
            observations: &observations,
            triangulation: None,
            grid: BinGrid::unit(4),
            children: &[0],
            parents: &[],
            occupied: &occupied,
            new_bins: &occupied,
        };
        assert!(plotter.render(&frame).unwrap().is_some());
    }
}
