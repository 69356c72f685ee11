//! Progress, result and record types produced by an exploration run.

use serde::{Deserialize, Serialize};

use super::{Bin, BoxRecord};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Init,
    Seeding,
    Generating,
    CheckStop,
    Done,
    Failed,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// All configured generations ran.
    GenerationBudget,
    /// The last coverage benchmark was met.
    BenchmarksReached,
    /// The convergence score fell to the cutoff.
    Converged,
}

/// A coverage benchmark met during the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkHit {
    /// Configured fraction.
    pub benchmark: f64,
    /// Generation at which it was met.
    pub generation: usize,
    /// Coverage actually achieved at that generation.
    pub coverage: f64,
}

/// Per-generation time series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvergenceHistory {
    /// Generation index for each entry.
    pub generations: Vec<usize>,
    /// Convergence score.
    pub scores: Vec<f64>,
    /// Coverage fraction.
    pub coverage: Vec<f64>,
    /// Occupied bin count.
    pub occupied: Vec<usize>,
    /// Bins per axis in effect.
    pub bins: Vec<usize>,
}

impl ConvergenceHistory {
    pub fn push(&mut self, generation: usize, score: f64, coverage: f64, occupied: usize, bins: usize) {
        self.generations.push(generation);
        self.scores.push(score);
        self.coverage.push(coverage);
        self.occupied.push(occupied);
        self.bins.push(bins);
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn last_score(&self) -> Option<f64> {
        self.scores.last().copied()
    }
}

/// Progress reported after seeding and after every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgress {
    pub phase: RunPhase,
    pub generation: usize,
    pub total_generations: usize,
    pub population: usize,
    pub bins: usize,
    pub occupied: usize,
    pub new_bins: usize,
    pub coverage: f64,
    pub convergence_score: f64,
}

/// Summary returned when a run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub stop_reason: StopReason,
    /// Last generation that ran.
    pub generations: usize,
    pub total_boxes: usize,
    pub bins: usize,
    pub occupied_bins: Vec<Bin>,
    pub coverage: f64,
    pub benchmarks_hit: Vec<BenchmarkHit>,
    pub history: ConvergenceHistory,
    pub elapsed_seconds: f64,
}

/// Mutation strength recorded for a bin at a generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRecord {
    pub generation: usize,
    pub bins: usize,
    pub bin: Bin,
    pub strength: f64,
}

/// Everything a generation adds, as committed to a run store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Bins per axis the `bins` field was computed under.
    pub num_bins: usize,
    pub boxes: Vec<BoxRecord>,
    /// Bin of each box, parallel to `boxes`.
    pub bins: Vec<Bin>,
    pub coverage: f64,
    pub convergence_score: f64,
    #[serde(default)]
    pub strengths: Vec<StrengthRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_push() {
        let mut history = ConvergenceHistory::default();
        assert!(history.is_empty());
        history.push(0, 0.9, 0.1, 10, 10);
        history.push(1, 0.8, 0.2, 20, 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last_score(), Some(0.8));
        assert_eq!(history.generations, vec![0, 1]);
    }
}
