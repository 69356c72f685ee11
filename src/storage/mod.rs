//! Optional durable mirror of a run.
//!
//! The engine commits one [`GenerationRecord`](crate::schema::GenerationRecord)
//! per generation plus the convergence time series. A store is never needed
//! for the algorithm itself; it exists for resuming runs and for post-hoc
//! analysis.
//!
//! # Directory layout
//!
//! ```text
//! <store_dir>/
//!   gen_00000.json     seed generation
//!   gen_00001.json     boxes, bins and strength records of generation 1
//!   ...
//!   convergence.json   convergence history, rewritten every generation
//! ```
//!
//! Every file is written to a temporary name and renamed into place, so a
//! generation is either fully visible or absent.

mod store;

pub use store::{JsonDirStore, MemoryStore, RunStore, StoreError};
