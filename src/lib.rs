//! Hull Explorer - Biased space-filling exploration of a response surface.
//!
//! This crate samples a `d`-dimensional unit cube generation by generation,
//! maps every point through a scoring function into a 2D observation space,
//! and steers new samples toward the sparsely covered parts of that space.
//! Coverage is tracked on a grid of bins.
//!
//! # Architecture
//!
//! - `schema`: Configuration, point and report types
//! - `compute`: Triangulation, parent selection, mutation, binning and the
//!   generation loop
//! - `storage`: Optional per-generation run store
//! - `render`: Diagnostic triangulation plots
//!
//! # Example
//!
//! ```rust,no_run
//! use hull_explorer::{
//!     compute::ExplorationEngine,
//!     schema::{RunConfig, StructureFunction},
//! };
//!
//! let config = RunConfig {
//!     structure: StructureFunction::Z12,
//!     number_of_generations: 50,
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut engine = ExplorationEngine::new(config).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: {:.1}% covered", progress.generation, progress.coverage * 100.0);
//!     })
//!     .unwrap();
//!
//! println!("Stopped after {} generations: {:?}", result.generations, result.stop_reason);
//! ```

pub mod compute;
pub mod render;
pub mod schema;
pub mod storage;

// Re-export commonly used types
pub use compute::{ExplorationEngine, ExploreError, ScoringFunction};
pub use schema::{RunConfig, RunResult, StopReason};
