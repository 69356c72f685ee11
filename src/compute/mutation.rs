//! Child generation by perturbing a parent's coordinates.

use super::rng::ExplorerRng;
use crate::schema::{DofSelection, MutationConfig, MutationScheme, PerturbationPolicy};

/// Produces one child point per call from a parent point and a strength.
#[derive(Debug, Clone, Copy)]
pub struct Mutator {
    policy: PerturbationPolicy,
    dofs: DofSelection,
}

impl Mutator {
    pub fn new(policy: PerturbationPolicy, dofs: DofSelection) -> Self {
        Self { policy, dofs }
    }

    pub fn from_config(config: &MutationConfig) -> Self {
        Self::new(config.policy, config.dofs)
    }

    /// Mutate a copy of `parent` with the given strength.
    ///
    /// The weighted policy is not clamped: a coordinate that starts outside
    /// [0, 1] or a strength above 1 can leave the unit interval.
    pub fn mutate(&self, parent: &[f64], strength: f64, rng: &mut ExplorerRng) -> Vec<f64> {
        let mut child = parent.to_vec();
        if child.is_empty() {
            return child;
        }
        for index in self.coordinates(child.len(), rng) {
            child[index] = perturb(self.policy, child[index], strength, rng);
        }
        child
    }

    fn coordinates(&self, dimensions: usize, rng: &mut ExplorerRng) -> Vec<usize> {
        match self.dofs {
            DofSelection::All => (0..dimensions).collect(),
            DofSelection::One => vec![rng.index(dimensions)],
            DofSelection::Subset { count } => rng.distinct_indices(dimensions, count),
        }
    }
}

/// Apply one perturbation policy to a single coordinate.
pub fn perturb(policy: PerturbationPolicy, x: f64, strength: f64, rng: &mut ExplorerRng) -> f64 {
    match policy {
        PerturbationPolicy::Weighted => x + strength * (rng.unit() - x),
        PerturbationPolicy::Unweighted => {
            let m = rng.sign() * strength * rng.unit();
            if m < 0.0 {
                x + x * m
            } else {
                x + (1.0 - x) * m
            }
        }
        PerturbationPolicy::Wrapped => {
            let wrapped = (x + rng.sign() * strength * rng.unit()).rem_euclid(1.0);
            // rem_euclid rounds tiny negatives up to exactly 1.0.
            if wrapped >= 1.0 { 0.0 } else { wrapped }
        }
    }
}

/// Strength for one child under a non-adaptive scheme.
///
/// Returns `None` for the adaptive scheme, whose strength depends on the
/// parent's bin and is looked up by the caller.
pub fn scheme_strength(
    scheme: MutationScheme,
    initial_strength: f64,
    rng: &mut ExplorerRng,
) -> Option<f64> {
    match scheme {
        MutationScheme::Random => Some(1.0),
        MutationScheme::Flat => Some(initial_strength),
        MutationScheme::Hybrid => Some(if rng.coin() { 1.0 } else { initial_strength }),
        MutationScheme::Adaptive => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_strength_is_identity() {
        let mut rng = ExplorerRng::new(5);
        let parent = [0.1, 0.5, 0.9];
        for policy in [
            PerturbationPolicy::Weighted,
            PerturbationPolicy::Unweighted,
            PerturbationPolicy::Wrapped,
        ] {
            let child = Mutator::new(policy, DofSelection::All).mutate(&parent, 0.0, &mut rng);
            assert_eq!(child, parent.to_vec(), "{policy:?}");
        }
    }

    #[test]
    fn test_one_dof_changes_single_coordinate() {
        let mutator = Mutator::new(PerturbationPolicy::Weighted, DofSelection::One);
        let mut rng = ExplorerRng::new(8);
        let parent = [0.25; 6];
        for _ in 0..50 {
            let child = mutator.mutate(&parent, 0.7, &mut rng);
            let changed = child.iter().zip(&parent).filter(|(a, b)| a != b).count();
            assert!(changed <= 1);
            assert_eq!(child.len(), parent.len());
        }
    }

    #[test]
    fn test_subset_changes_at_most_count() {
        let mutator = Mutator::new(
            PerturbationPolicy::Unweighted,
            DofSelection::Subset { count: 2 },
        );
        let mut rng = ExplorerRng::new(13);
        let parent = [0.5; 5];
        let mut seen_two = false;
        for _ in 0..100 {
            let child = mutator.mutate(&parent, 1.0, &mut rng);
            let changed = child.iter().zip(&parent).filter(|(a, b)| a != b).count();
            assert!(changed <= 2);
            seen_two |= changed == 2;
        }
        assert!(seen_two);
    }

    #[test]
    fn test_weighted_can_leave_unit_interval() {
        // The weighted policy is unclamped; a parent already outside [0, 1]
        // with a small strength stays outside.
        let mut rng = ExplorerRng::new(1);
        let child = perturb(PerturbationPolicy::Weighted, 1.5, 0.1, &mut rng);
        assert!(child > 1.0);
        // Strengths above 1 overshoot the random target.
        let mut escaped = false;
        for _ in 0..200 {
            let v = perturb(PerturbationPolicy::Weighted, 0.5, 3.0, &mut rng);
            escaped |= !(0.0..=1.0).contains(&v);
        }
        assert!(escaped);
    }

    #[test]
    fn test_wrapped_handles_negative_wrap() {
        let mut rng = ExplorerRng::new(3);
        for _ in 0..500 {
            let v = perturb(PerturbationPolicy::Wrapped, 0.0, 1.0, &mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_scheme_strength() {
        let mut rng = ExplorerRng::new(0);
        assert_eq!(scheme_strength(MutationScheme::Random, 0.2, &mut rng), Some(1.0));
        assert_eq!(scheme_strength(MutationScheme::Flat, 0.2, &mut rng), Some(0.2));
        assert_eq!(scheme_strength(MutationScheme::Adaptive, 0.2, &mut rng), None);
        let draws: Vec<f64> = (0..100)
            .filter_map(|_| scheme_strength(MutationScheme::Hybrid, 0.2, &mut rng))
            .collect();
        assert!(draws.iter().all(|&s| s == 1.0 || s == 0.2));
        assert!(draws.contains(&1.0) && draws.contains(&0.2));
    }

    proptest! {
        #[test]
        fn prop_unweighted_stays_in_closed_unit(
            parent in prop::collection::vec(0.0f64..=1.0, 1..8),
            strength in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = ExplorerRng::new(seed);
            let child = Mutator::new(PerturbationPolicy::Unweighted, DofSelection::All)
                .mutate(&parent, strength, &mut rng);
            prop_assert_eq!(child.len(), parent.len());
            for v in child {
                prop_assert!((0.0..=1.0).contains(&v), "{} out of [0, 1]", v);
            }
        }

        #[test]
        fn prop_wrapped_stays_in_half_open_unit(
            parent in prop::collection::vec(0.0f64..1.0, 1..8),
            strength in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = ExplorerRng::new(seed);
            let child = Mutator::new(PerturbationPolicy::Wrapped, DofSelection::All)
                .mutate(&parent, strength, &mut rng);
            for v in child {
                prop_assert!((0.0..1.0).contains(&v), "{} out of [0, 1)", v);
            }
        }
    }
}
