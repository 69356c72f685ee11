//! Append-only population of scored boxes.

use std::collections::{BTreeMap, HashMap};

use super::strength::BinOutcome;
use crate::schema::{Bin, BoxRecord, Candidate, Observation};

/// All boxes created so far, grouped by generation.
///
/// Boxes are only ever appended; ids are positions in the population.
#[derive(Debug, Clone, Default)]
pub struct Population {
    boxes: Vec<BoxRecord>,
    observations: Vec<Observation>,
    /// Index of the first box of each generation, in generation order.
    generation_starts: Vec<(usize, usize)>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generation of scored candidates. Returns the new boxes.
    ///
    /// `generation` must be greater than every generation already present.
    pub fn append_generation(
        &mut self,
        generation: usize,
        scored: Vec<(Candidate, Observation)>,
    ) -> &[BoxRecord] {
        debug_assert!(
            self.last_generation().is_none_or(|last| generation > last),
            "generations must be appended in increasing order"
        );
        let start = self.boxes.len();
        self.generation_starts.push((generation, start));
        for (offset, (candidate, observation)) in scored.into_iter().enumerate() {
            self.observations.push(observation);
            self.boxes.push(BoxRecord {
                id: start + offset,
                generation,
                parent: candidate.parent,
                point: candidate.point,
                observation,
            });
        }
        &self.boxes[start..]
    }

    /// Append boxes loaded from a run store.
    ///
    /// Ids are reassigned to positions; parent links are remapped through
    /// the stored ids. Every parent must appear before its children. On
    /// error the population is left unchanged.
    pub fn extend_from_records(&mut self, records: Vec<BoxRecord>) -> Result<(), LineageError> {
        let mut remap = HashMap::new();
        let mut next = self.boxes.len();
        let mut remapped = Vec::with_capacity(records.len());
        for mut record in records {
            if let Some(parent) = record.parent {
                let Some(&mapped) = remap.get(&parent) else {
                    return Err(LineageError::DanglingParent {
                        id: record.id,
                        generation: record.generation,
                        parent,
                    });
                };
                record.parent = Some(mapped);
            }
            remap.insert(record.id, next);
            record.id = next;
            next += 1;
            remapped.push(record);
        }

        let mut current: Option<usize> = None;
        for record in remapped {
            if current != Some(record.generation) {
                current = Some(record.generation);
                self.generation_starts
                    .push((record.generation, self.boxes.len()));
            }
            self.observations.push(record.observation);
            self.boxes.push(record);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&BoxRecord> {
        self.boxes.get(id)
    }

    pub fn boxes(&self) -> &[BoxRecord] {
        &self.boxes
    }

    /// Observations of every box, indexed by box id.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn last_generation(&self) -> Option<usize> {
        self.generation_starts.last().map(|&(g, _)| g)
    }

    /// Boxes created in `generation`.
    pub fn generation(&self, generation: usize) -> &[BoxRecord] {
        let Some(pos) = self
            .generation_starts
            .iter()
            .position(|&(g, _)| g == generation)
        else {
            return &[];
        };
        let start = self.generation_starts[pos].1;
        let end = self
            .generation_starts
            .get(pos + 1)
            .map_or(self.boxes.len(), |&(_, s)| s);
        &self.boxes[start..end]
    }

    /// Number of boxes created before `generation`.
    pub fn count_before(&self, generation: usize) -> usize {
        self.generation_starts
            .iter()
            .find(|&&(g, _)| g >= generation)
            .map_or(self.boxes.len(), |&(_, start)| start)
    }

    /// Chain of parent ids from `id` back to its seed, starting with the
    /// direct parent.
    pub fn ancestry(&self, id: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.boxes.get(id).and_then(|b| b.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.boxes.get(parent).and_then(|b| b.parent);
        }
        chain
    }

    /// Ids of the boxes whose parent is `id`.
    pub fn children_of(&self, id: usize) -> Vec<usize> {
        self.boxes
            .iter()
            .filter(|b| b.parent == Some(id))
            .map(|b| b.id)
            .collect()
    }

    /// For every parent bin, how many children of `generation` came from it
    /// and how many of those landed in the same bin.
    ///
    /// `assignments` is the bin of every box, indexed by id.
    pub fn children_in_parent_bin(
        &self,
        generation: usize,
        assignments: &[Bin],
    ) -> BTreeMap<Bin, BinOutcome> {
        let mut outcomes: BTreeMap<Bin, BinOutcome> = BTreeMap::new();
        for child in self.generation(generation) {
            let Some(parent) = child.parent else {
                continue;
            };
            let (Some(&parent_bin), Some(&child_bin)) =
                (assignments.get(parent), assignments.get(child.id))
            else {
                continue;
            };
            let outcome = outcomes.entry(parent_bin).or_default();
            outcome.children += 1;
            if child_bin == parent_bin {
                outcome.stayed += 1;
            }
        }
        outcomes
    }
}

/// Broken parent links in loaded boxes.
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    #[error("Box {id} of generation {generation} refers to parent {parent}, which was not loaded")]
    DanglingParent {
        id: usize,
        generation: usize,
        parent: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(points: &[(f64, Option<usize>)]) -> Vec<(Candidate, Observation)> {
        points
            .iter()
            .map(|&(v, parent)| {
                (
                    Candidate {
                        point: vec![v, v],
                        parent,
                    },
                    Observation::new(v, v),
                )
            })
            .collect()
    }

    fn sample() -> Population {
        let mut population = Population::new();
        population.append_generation(0, scored(&[(0.1, None), (0.2, None), (0.3, None)]));
        population.append_generation(1, scored(&[(0.4, Some(0)), (0.5, Some(2))]));
        population.append_generation(2, scored(&[(0.6, Some(3))]));
        population
    }

    #[test]
    fn test_append_assigns_ids() {
        let population = sample();
        assert_eq!(population.len(), 6);
        assert_eq!(population.last_generation(), Some(2));
        let ids: Vec<usize> = population.boxes().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(population.observations().len(), 6);
    }

    #[test]
    fn test_generation_slices() {
        let population = sample();
        assert_eq!(population.generation(0).len(), 3);
        assert_eq!(population.generation(1).len(), 2);
        assert_eq!(population.generation(2)[0].id, 5);
        assert!(population.generation(9).is_empty());
        assert_eq!(population.count_before(1), 3);
        assert_eq!(population.count_before(2), 5);
        assert_eq!(population.count_before(3), 6);
    }

    #[test]
    fn test_ancestry() {
        let population = sample();
        assert_eq!(population.ancestry(5), vec![3, 0]);
        assert!(population.ancestry(1).is_empty());
        assert_eq!(population.children_of(0), vec![3]);
    }

    #[test]
    fn test_extend_from_records_remaps_ids() {
        let source = sample();
        let mut records: Vec<BoxRecord> = source.boxes().to_vec();
        for r in &mut records {
            r.id += 100;
            r.parent = r.parent.map(|p| p + 100);
        }
        let mut population = Population::new();
        population.extend_from_records(records).unwrap();
        assert_eq!(population.boxes(), source.boxes());
        assert_eq!(population.generation(1).len(), 2);
    }

    #[test]
    fn test_extend_from_records_rejects_missing_parent() {
        // Generations 1 and 2 without the seeds their parents live in.
        let records: Vec<BoxRecord> = sample().boxes()[3..].to_vec();
        let mut population = Population::new();
        let err = population.extend_from_records(records).unwrap_err();
        assert!(matches!(
            err,
            LineageError::DanglingParent {
                id: 3,
                generation: 1,
                parent: 0
            }
        ));
        assert!(population.is_empty());
        assert!(population.last_generation().is_none());
    }

    #[test]
    fn test_children_in_parent_bin() {
        let population = sample();
        // Boxes 0..=5; box 3 (parent 0) stays, box 4 (parent 2) moves.
        let assignments = vec![
            Bin::new(0, 0),
            Bin::new(0, 0),
            Bin::new(1, 1),
            Bin::new(0, 0),
            Bin::new(2, 2),
            Bin::new(2, 2),
        ];
        let outcomes = population.children_in_parent_bin(1, &assignments);
        assert_eq!(
            outcomes[&Bin::new(0, 0)],
            BinOutcome {
                children: 1,
                stayed: 1
            }
        );
        assert_eq!(
            outcomes[&Bin::new(1, 1)],
            BinOutcome {
                children: 1,
                stayed: 0
            }
        );
        assert!(population.children_in_parent_bin(0, &assignments).is_empty());
    }
}
