//! Diagnostic plots of the observation space.
//!
//! Rendering is purely observational: the engine hands a [`Frame`] to a
//! [`Visualizer`] after each generation and logs, but otherwise ignores,
//! any failure.

mod plot;

pub use plot::{Frame, RenderError, SvgPlotter, Visualizer};
