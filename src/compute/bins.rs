//! Discretization of observation space and occupied-bin bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{Bin, BinningConfig, ConvergenceMetric, Observation};

/// Bin of `value` along one axis.
///
/// `floor((value - min) / ((max - min) / bins))`, clamped into `0..bins`.
/// The exact upper bound and anything out of range land in the edge bins.
pub fn calc_bin(value: f64, bound_min: f64, bound_max: f64, bins: usize) -> usize {
    let step = (bound_max - bound_min) / bins as f64;
    let assigned = ((value - bound_min) / step).floor();
    // NaN falls through both comparisons and casts to 0.
    if assigned >= (bins - 1) as f64 {
        bins - 1
    } else if assigned > 0.0 {
        assigned as usize
    } else {
        0
    }
}

/// Fraction of the `bins × bins` grid that is occupied.
pub fn coverage_fraction(occupied: &BTreeSet<Bin>, bins: usize) -> f64 {
    occupied.len() as f64 / (bins * bins) as f64
}

/// A square grid over a rectangular region of observation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinGrid {
    pub bins: usize,
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
}

impl BinGrid {
    /// Grid over the unit square.
    pub fn unit(bins: usize) -> Self {
        Self {
            bins,
            x_bounds: (0.0, 1.0),
            y_bounds: (0.0, 1.0),
        }
    }

    /// Same region, different bin count.
    pub fn with_bins(&self, bins: usize) -> Self {
        Self { bins, ..*self }
    }

    /// Bin of an observation, each axis independently.
    #[inline]
    pub fn bin_of(&self, observation: &Observation) -> Bin {
        Bin::new(
            calc_bin(observation.x, self.x_bounds.0, self.x_bounds.1, self.bins),
            calc_bin(observation.y, self.y_bounds.0, self.y_bounds.1, self.bins),
        )
    }

    /// Total number of bins.
    pub fn len(&self) -> usize {
        self.bins * self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins == 0
    }
}

/// Bin counts per generation.
///
/// With `L` levels and `G` generations, generation 0 and the first
/// `ceil(G / L)` generations use the first level; each later level covers
/// an equal share, the first `G mod L` levels getting one extra generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinSchedule {
    levels: Vec<usize>,
    /// First generation of each level.
    starts: Vec<usize>,
}

impl BinSchedule {
    /// A single level for the whole run.
    pub fn fixed(bins: usize) -> Self {
        Self {
            levels: vec![bins],
            starts: vec![0],
        }
    }

    /// Spread `levels` over `generations` generations.
    pub fn new(levels: Vec<usize>, generations: usize) -> Self {
        let count = levels.len().max(1);
        let base = generations / count;
        let extra = generations % count;
        let mut starts = Vec::with_capacity(levels.len());
        let mut next = 1;
        for k in 0..levels.len() {
            starts.push(if k == 0 { 0 } else { next });
            next += base + usize::from(k < extra);
        }
        Self { levels, starts }
    }

    pub fn from_config(config: &BinningConfig, generations: usize) -> Self {
        match &config.schedule {
            Some(levels) => Self::new(levels.clone(), generations),
            None => Self::fixed(config.bins),
        }
    }

    /// Bin count in effect at `generation`.
    pub fn bins_at(&self, generation: usize) -> usize {
        let level = self
            .starts
            .iter()
            .rposition(|&start| start <= generation)
            .unwrap_or(0);
        self.levels[level]
    }

    /// Generations at which the bin count changes.
    pub fn checkpoints(&self) -> Vec<usize> {
        (1..self.levels.len())
            .filter(|&k| self.levels[k] != self.levels[k - 1])
            .map(|k| self.starts[k])
            .collect()
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }
}

/// Occupied-bin set with per-bin counts and a bin assignment for every
/// recorded observation.
#[derive(Debug, Clone)]
pub struct BinTracker {
    grid: BinGrid,
    /// Bin of each recorded observation, in recording order.
    assignments: Vec<Bin>,
    counts: BTreeMap<Bin, usize>,
}

impl BinTracker {
    pub fn new(grid: BinGrid) -> Self {
        Self {
            grid,
            assignments: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn grid(&self) -> &BinGrid {
        &self.grid
    }

    pub fn bins(&self) -> usize {
        self.grid.bins
    }

    /// Record new observations; returns the bins they occupied for the
    /// first time.
    pub fn update<'a, I>(&mut self, observations: I) -> BTreeSet<Bin>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut new_bins = BTreeSet::new();
        for observation in observations {
            let bin = self.grid.bin_of(observation);
            let count = self.counts.entry(bin).or_insert(0);
            if *count == 0 {
                new_bins.insert(bin);
            }
            *count += 1;
            self.assignments.push(bin);
        }
        new_bins
    }

    /// Recompute every assignment under a new bin count.
    ///
    /// Bins from different granularities are not comparable, so the
    /// occupied set is rebuilt from scratch.
    pub fn rebin(&mut self, bins: usize, observations: &[Observation]) {
        self.grid = self.grid.with_bins(bins);
        self.assignments.clear();
        self.counts.clear();
        self.update(observations);
    }

    /// Bin assigned to the `index`-th recorded observation.
    pub fn bin_of_recorded(&self, index: usize) -> Option<Bin> {
        self.assignments.get(index).copied()
    }

    pub fn assignments(&self) -> &[Bin] {
        &self.assignments
    }

    /// Distinct occupied bins.
    pub fn occupied(&self) -> BTreeSet<Bin> {
        self.counts.keys().copied().collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of recorded observations in `bin`.
    pub fn count(&self, bin: &Bin) -> usize {
        self.counts.get(bin).copied().unwrap_or(0)
    }

    /// Occupied bins with their counts.
    pub fn counts(&self) -> &BTreeMap<Bin, usize> {
        &self.counts
    }

    pub fn coverage(&self) -> f64 {
        self.counts.len() as f64 / self.grid.len() as f64
    }

    /// Convergence score under the chosen metric.
    pub fn convergence_score(&self, metric: ConvergenceMetric) -> f64 {
        match metric {
            ConvergenceMetric::EmptyFraction => 1.0 - self.coverage(),
            ConvergenceMetric::BinCountVariance => self.count_variation(),
        }
    }

    /// Coefficient of variation of counts over all bins, empty ones included.
    fn count_variation(&self) -> f64 {
        let total_bins = self.grid.len() as f64;
        let total: usize = self.counts.values().sum();
        if total == 0 {
            return f64::INFINITY;
        }
        let mean = total as f64 / total_bins;
        let occupied_sq: f64 = self
            .counts
            .values()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum();
        let empty = total_bins - self.counts.len() as f64;
        let variance = (occupied_sq + empty * mean * mean) / total_bins;
        variance.sqrt() / mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_calc_bin_midpoint() {
        assert_eq!(calc_bin(0.5, 0.0, 1.0, 4), 2);
    }

    #[test]
    fn test_calc_bin_upper_bound_clamped() {
        assert_eq!(calc_bin(1.0, 0.0, 1.0, 4), 3);
        assert_eq!(calc_bin(7.5, 0.0, 1.0, 4), 3);
    }

    #[test]
    fn test_calc_bin_below_range_clamped() {
        assert_eq!(calc_bin(-0.1, 0.0, 1.0, 4), 0);
        assert_eq!(calc_bin(f64::NAN, 0.0, 1.0, 4), 0);
    }

    #[test]
    fn test_calc_bin_offset_bounds() {
        assert_eq!(calc_bin(2.5, 2.0, 4.0, 4), 1);
    }

    #[test]
    fn test_tracker_update_reports_new_bins() {
        let mut tracker = BinTracker::new(BinGrid::unit(4));
        let first = [Observation::new(0.1, 0.1), Observation::new(0.9, 0.9)];
        let new_bins = tracker.update(&first);
        assert_eq!(new_bins.len(), 2);

        let second = [Observation::new(0.12, 0.2), Observation::new(0.6, 0.1)];
        let new_bins = tracker.update(&second);
        assert_eq!(new_bins, BTreeSet::from([Bin::new(2, 0)]));
        assert_eq!(tracker.occupied_count(), 3);
        assert_eq!(tracker.count(&Bin::new(0, 0)), 2);
        assert_eq!(tracker.bin_of_recorded(3), Some(Bin::new(2, 0)));
        assert!((tracker.coverage() - 3.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_rebin_rebuilds_from_scratch() {
        let observations = vec![
            Observation::new(0.1, 0.1),
            Observation::new(0.2, 0.2),
            Observation::new(0.9, 0.9),
        ];
        let mut tracker = BinTracker::new(BinGrid::unit(2));
        tracker.update(&observations);
        assert_eq!(tracker.occupied_count(), 2);

        tracker.rebin(10, &observations);
        assert_eq!(tracker.bins(), 10);
        assert_eq!(
            tracker.occupied(),
            BTreeSet::from([Bin::new(1, 1), Bin::new(2, 2), Bin::new(9, 9)])
        );
        assert_eq!(tracker.assignments().len(), 3);
    }

    #[test]
    fn test_rebin_idempotent() {
        let observations: Vec<Observation> = (0..50)
            .map(|i| Observation::new((i as f64 * 0.37) % 1.0, (i as f64 * 0.11) % 1.0))
            .collect();
        let mut tracker = BinTracker::new(BinGrid::unit(3));
        tracker.update(&observations);

        tracker.rebin(7, &observations);
        let once = tracker.occupied();
        let once_counts = tracker.counts().clone();
        tracker.rebin(7, &observations);
        assert_eq!(tracker.occupied(), once);
        assert_eq!(tracker.counts(), &once_counts);
    }

    #[test]
    fn test_convergence_scores() {
        let mut tracker = BinTracker::new(BinGrid::unit(2));
        assert!(tracker.convergence_score(ConvergenceMetric::BinCountVariance).is_infinite());

        // One box in each of the four bins: perfectly even.
        tracker.update(&[
            Observation::new(0.1, 0.1),
            Observation::new(0.9, 0.1),
            Observation::new(0.1, 0.9),
            Observation::new(0.9, 0.9),
        ]);
        assert!(tracker.convergence_score(ConvergenceMetric::EmptyFraction).abs() < 1e-12);
        assert!(tracker.convergence_score(ConvergenceMetric::BinCountVariance).abs() < 1e-12);

        tracker.update(&[Observation::new(0.1, 0.1); 4]);
        assert!(tracker.convergence_score(ConvergenceMetric::BinCountVariance) > 0.5);
    }

    #[test]
    fn test_schedule_even_split() {
        let schedule = BinSchedule::new(vec![5, 10, 20], 10);
        // 10 generations over 3 levels: 4, 3, 3.
        assert_eq!(schedule.bins_at(0), 5);
        assert_eq!(schedule.bins_at(4), 5);
        assert_eq!(schedule.bins_at(5), 10);
        assert_eq!(schedule.bins_at(7), 10);
        assert_eq!(schedule.bins_at(8), 20);
        assert_eq!(schedule.bins_at(10), 20);
        assert_eq!(schedule.checkpoints(), vec![5, 8]);
    }

    #[test]
    fn test_schedule_fixed() {
        let schedule = BinSchedule::fixed(12);
        assert_eq!(schedule.bins_at(0), 12);
        assert_eq!(schedule.bins_at(1000), 12);
        assert!(schedule.checkpoints().is_empty());
        assert_eq!(schedule.levels(), &[12]);
    }

    #[test]
    fn test_schedule_from_config_prefers_levels() {
        let config = BinningConfig {
            bins: 7,
            schedule: Some(vec![4, 8]),
            ..Default::default()
        };
        assert_eq!(BinSchedule::from_config(&config, 4).levels(), &[4, 8]);
        let fixed = BinningConfig {
            schedule: None,
            ..config
        };
        assert_eq!(BinSchedule::from_config(&fixed, 4).levels(), &[7]);
    }

    #[test]
    fn test_schedule_repeated_level_has_no_checkpoint() {
        let schedule = BinSchedule::new(vec![10, 10, 20], 6);
        assert_eq!(schedule.checkpoints(), vec![5]);
    }

    proptest! {
        #[test]
        fn prop_calc_bin_in_range(value in -10.0f64..10.0, bins in 1usize..100) {
            let bin = calc_bin(value, 0.0, 1.0, bins);
            prop_assert!(bin < bins);
        }

        #[test]
        fn prop_coverage_in_unit_interval(
            points in prop::collection::vec((-0.5f64..1.5, -0.5f64..1.5), 0..200),
            bins in 1usize..20,
        ) {
            let observations: Vec<Observation> =
                points.into_iter().map(Observation::from).collect();
            let mut tracker = BinTracker::new(BinGrid::unit(bins));
            let mut previous = 0;
            for chunk in observations.chunks(10) {
                tracker.update(chunk);
                prop_assert!(tracker.occupied_count() >= previous);
                previous = tracker.occupied_count();
            }
            let coverage = coverage_fraction(&tracker.occupied(), bins);
            prop_assert!((0.0..=1.0).contains(&coverage));
            prop_assert_eq!(coverage == 1.0, tracker.occupied_count() == bins * bins);
        }
    }
}
