//! Per-bin mutation strength for the adaptive scheme.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::schema::{AdaptiveConfig, Bin, StrengthRecord};

/// How the children of one parent bin fared in a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinOutcome {
    /// Children whose parent sat in the bin.
    pub children: usize,
    /// Those children that landed in the same bin as their parent.
    pub stayed: usize,
}

impl BinOutcome {
    pub fn stay_fraction(&self) -> f64 {
        if self.children == 0 {
            0.0
        } else {
            self.stayed as f64 / self.children as f64
        }
    }
}

/// Strength records keyed by bin granularity and bin.
///
/// Each update writes a new record for its generation; older records are
/// kept, so the strength in force at any past generation can be recovered.
#[derive(Debug, Clone)]
pub struct MutationStrengthStore {
    initial: f64,
    records: HashMap<(usize, Bin), BTreeMap<usize, f64>>,
}

impl MutationStrengthStore {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            records: HashMap::new(),
        }
    }

    /// Strength in force at `generation`: the latest record at or before it,
    /// or the initial strength when there is none.
    pub fn get_prior(&self, generation: usize, bins: usize, bin: Bin) -> f64 {
        self.records
            .get(&(bins, bin))
            .and_then(|history| history.range(..=generation).next_back())
            .map_or(self.initial, |(_, &strength)| strength)
    }

    pub fn set(&mut self, generation: usize, bins: usize, bin: Bin, strength: f64) {
        self.records
            .entry((bins, bin))
            .or_default()
            .insert(generation, strength);
    }

    /// Adjust the strength of every bin in `outcomes` and record the result
    /// at `generation`. Returns the new records.
    pub fn adapt(
        &mut self,
        generation: usize,
        bins: usize,
        outcomes: &BTreeMap<Bin, BinOutcome>,
        config: &AdaptiveConfig,
    ) -> Vec<StrengthRecord> {
        let mut written = Vec::with_capacity(outcomes.len());
        for (&bin, outcome) in outcomes {
            if outcome.children == 0 {
                continue;
            }
            let current = self.get_prior(generation, bins, bin);
            let fraction = outcome.stay_fraction();
            let next = if fraction >= config.raise_above {
                (current * config.raise_factor).min(config.max_strength)
            } else if fraction <= config.lower_below {
                (current * config.lower_factor).max(config.min_strength)
            } else {
                current
            };
            if next != current {
                debug!(
                    "bin ({}, {}): {:.0}% stayed, strength {current:.4} -> {next:.4}",
                    bin.i,
                    bin.j,
                    fraction * 100.0
                );
            }
            self.set(generation, bins, bin, next);
            written.push(StrengthRecord {
                generation,
                bins,
                bin,
                strength: next,
            });
        }
        written
    }

    /// Every record, ordered by granularity, bin and generation.
    pub fn records(&self) -> Vec<StrengthRecord> {
        let mut all: Vec<StrengthRecord> = self
            .records
            .iter()
            .flat_map(|(&(bins, bin), history)| {
                history.iter().map(move |(&generation, &strength)| StrengthRecord {
                    generation,
                    bins,
                    bin,
                    strength,
                })
            })
            .collect();
        all.sort_by(|a, b| (a.bins, a.bin, a.generation).cmp(&(b.bins, b.bin, b.generation)));
        all
    }

    /// Restore records from a run store.
    pub fn extend_from_records(&mut self, records: &[StrengthRecord]) {
        for r in records {
            self.set(r.generation, r.bins, r.bin, r.strength);
        }
    }

    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
