//! Compute module - Geometry, selection, mutation, binning and the
//! generation loop.

mod bins;
mod engine;
mod geometry;
mod mutation;
mod population;
mod rng;
mod scoring;
mod selection;
mod strength;

pub use bins::*;
pub use engine::*;
pub use geometry::*;
pub use mutation::*;
pub use population::*;
pub use rng::*;
pub use scoring::*;
pub use selection::*;
pub use strength::*;
