//! Schema module - Configuration, point and report types for exploration runs.

mod config;
mod point;
mod report;

pub use config::*;
pub use point::*;
pub use report::*;
