//! Configuration types for an exploration run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level run configuration.
///
/// Built once at startup and passed by reference into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Dimensionality of the domain (length of every domain point).
    #[serde(default = "default_degrees_of_freedom")]
    pub degrees_of_freedom: usize,
    /// Scoring function mapping domain points into observation space.
    pub structure: StructureFunction,
    /// How children are produced each generation.
    pub generator: GeneratorConfig,
    /// How generation 0 is produced.
    #[serde(default)]
    pub initial_points: InitialPoints,
    /// Generation budget (not counting the seed generation).
    #[serde(default = "default_number_of_generations")]
    pub number_of_generations: usize,
    /// Children produced per generation.
    #[serde(default = "default_children_per_generation")]
    pub children_per_generation: usize,
    /// Discretization of observation space.
    #[serde(default)]
    pub binning: BinningConfig,
    /// Stopping criteria besides the generation budget.
    #[serde(default)]
    pub stopping: StopConfig,
    /// Optional output locations.
    #[serde(default)]
    pub output: OutputConfig,
    /// Random seed for selection and mutation. Entropy when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            degrees_of_freedom: default_degrees_of_freedom(),
            structure: StructureFunction::default(),
            generator: GeneratorConfig::default(),
            initial_points: InitialPoints::default(),
            number_of_generations: default_number_of_generations(),
            children_per_generation: default_children_per_generation(),
            binning: BinningConfig::default(),
            stopping: StopConfig::default(),
            output: OutputConfig::default(),
            random_seed: None,
        }
    }
}

fn default_degrees_of_freedom() -> usize {
    3
}
fn default_number_of_generations() -> usize {
    100
}
fn default_children_per_generation() -> usize {
    100
}

/// Scoring ("structure") function selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructureFunction {
    /// `((x + y) / 2, z^12)` over the first three coordinates.
    Z12,
    /// Observations confined to an annulus around the center.
    Donut {
        #[serde(default = "default_inner_radius")]
        inner_radius: f64,
        #[serde(default = "default_outer_radius")]
        outer_radius: f64,
    },
    /// Observations everywhere except an annulus around the center.
    InverseDonut {
        #[serde(default = "default_inner_radius")]
        inner_radius: f64,
        #[serde(default = "default_outer_radius")]
        outer_radius: f64,
    },
    /// Mean of the first half of the coordinates against the mean of the rest.
    MeanOfSubsets,
    /// Normalized norm against a Gaussian of the distance to a center.
    GaussianNorm {
        #[serde(default = "default_gaussian_center")]
        center: f64,
        #[serde(default = "default_gaussian_sigma")]
        sigma: f64,
    },
}

impl Default for StructureFunction {
    fn default() -> Self {
        Self::Z12
    }
}

impl StructureFunction {
    /// Smallest dimensionality this function can score.
    pub fn min_degrees_of_freedom(&self) -> usize {
        match self {
            Self::Z12 => 3,
            _ => 2,
        }
    }
}

fn default_inner_radius() -> f64 {
    0.5
}
fn default_outer_radius() -> f64 {
    0.9
}
fn default_gaussian_center() -> f64 {
    0.5
}
fn default_gaussian_sigma() -> f64 {
    0.25
}

/// Child generator selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// Fresh uniform points every generation, no parents.
    Random,
    /// Parents drawn from the hull and/or large simplices of the
    /// triangulated observation space, then mutated.
    ConvexHull {
        #[serde(default)]
        selection: SelectionConfig,
        #[serde(default)]
        mutation: MutationConfig,
    },
    /// Parents drawn preferentially from sparsely populated bins, then mutated.
    Mutate {
        #[serde(default)]
        mutation: MutationConfig,
    },
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::ConvexHull {
            selection: SelectionConfig::default(),
            mutation: MutationConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::ConvexHull { .. } => "convex_hull",
            Self::Mutate { .. } => "mutate",
        }
    }

    pub fn mutation(&self) -> Option<&MutationConfig> {
        match self {
            Self::Random => None,
            Self::ConvexHull { mutation, .. } | Self::Mutate { mutation } => Some(mutation),
        }
    }
}

/// Parent selection over the triangulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Fraction of parents drawn from hull vertices; the rest come from
    /// the largest simplices. 1.0 = hull only, 0.0 = simplices only.
    #[serde(default = "default_fraction_hull")]
    pub fraction_hull: f64,
    /// Number of largest triangles eligible for simplex sampling.
    #[serde(default = "default_best_triangles")]
    pub best_triangles: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            fraction_hull: default_fraction_hull(),
            best_triangles: default_best_triangles(),
        }
    }
}

fn default_fraction_hull() -> f64 {
    1.0
}
fn default_best_triangles() -> usize {
    20
}

/// Mutation settings for generators that have parents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-coordinate perturbation rule.
    #[serde(default)]
    pub policy: PerturbationPolicy,
    /// Which coordinates get perturbed.
    #[serde(default)]
    pub dofs: DofSelection,
    /// How the strength for each child is chosen.
    #[serde(default)]
    pub scheme: MutationScheme,
    /// Strength for the flat scheme and default for the adaptive one.
    #[serde(default = "default_initial_strength")]
    pub initial_strength: f64,
    /// Tuning for the adaptive scheme.
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            policy: PerturbationPolicy::default(),
            dofs: DofSelection::default(),
            scheme: MutationScheme::default(),
            initial_strength: default_initial_strength(),
            adaptive: AdaptiveConfig::default(),
        }
    }
}

fn default_initial_strength() -> f64 {
    0.2
}

/// Per-coordinate perturbation rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationPolicy {
    /// `x + s * (U - x)`. Not clamped; may leave [0, 1].
    #[default]
    Weighted,
    /// Signed contraction toward 0 or expansion toward 1. Stays in [0, 1].
    Unweighted,
    /// `(x ± s * U) mod 1`. Stays in [0, 1).
    Wrapped,
}

/// Which coordinates of a parent are perturbed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DofSelection {
    #[default]
    All,
    One,
    /// A uniformly random subset of `count` coordinates.
    Subset { count: usize },
}

/// How mutation strength is chosen per child.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MutationScheme {
    /// Always 1.0.
    Random,
    /// Always `initial_strength`.
    #[default]
    Flat,
    /// 1.0 or `initial_strength`, chosen uniformly.
    Hybrid,
    /// Per-bin strength adjusted from how often children stay in their
    /// parent's bin.
    Adaptive,
}

/// Tuning for the adaptive mutation scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Raise the strength when at least this fraction of children stays
    /// in the parent bin.
    #[serde(default = "default_raise_above")]
    pub raise_above: f64,
    /// Lower the strength when at most this fraction stays.
    #[serde(default = "default_lower_below")]
    pub lower_below: f64,
    #[serde(default = "default_raise_factor")]
    pub raise_factor: f64,
    #[serde(default = "default_lower_factor")]
    pub lower_factor: f64,
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,
    #[serde(default = "default_max_strength")]
    pub max_strength: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            raise_above: default_raise_above(),
            lower_below: default_lower_below(),
            raise_factor: default_raise_factor(),
            lower_factor: default_lower_factor(),
            min_strength: default_min_strength(),
            max_strength: default_max_strength(),
        }
    }
}

fn default_raise_above() -> f64 {
    0.8
}
fn default_lower_below() -> f64 {
    0.2
}
fn default_raise_factor() -> f64 {
    1.5
}
fn default_lower_factor() -> f64 {
    0.5
}
fn default_min_strength() -> f64 {
    0.01
}
fn default_max_strength() -> f64 {
    1.0
}

/// How the seed generation is produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialPoints {
    /// Uniform random points.
    Random {
        /// Number of seed points. Defaults to `children_per_generation`.
        #[serde(default)]
        count: Option<usize>,
        /// Seed governing only the initial points.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Every corner of the unit cube.
    #[default]
    DofCombinations,
    /// Continue from a run store written by a previous run.
    Resume { dir: PathBuf },
}

/// Discretization of observation space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Bins per axis (used when no schedule is given).
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Increasing bin counts spread evenly over the generation budget.
    #[serde(default)]
    pub schedule: Option<Vec<usize>>,
    #[serde(default = "default_bounds")]
    pub x_bounds: (f64, f64),
    #[serde(default = "default_bounds")]
    pub y_bounds: (f64, f64),
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            schedule: None,
            x_bounds: default_bounds(),
            y_bounds: default_bounds(),
        }
    }
}

fn default_bins() -> usize {
    40
}
fn default_bounds() -> (f64, f64) {
    (0.0, 1.0)
}

/// Early stopping criteria.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StopConfig {
    /// Ascending coverage fractions. Reaching the last one ends the run.
    #[serde(default)]
    pub benchmarks: Vec<f64>,
    /// Stop once the convergence score is at or below this value.
    #[serde(default)]
    pub convergence_cutoff: Option<f64>,
    /// Score recorded every generation.
    #[serde(default)]
    pub convergence_metric: ConvergenceMetric,
}

/// Per-generation convergence score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceMetric {
    /// Fraction of bins never occupied.
    #[default]
    EmptyFraction,
    /// Coefficient of variation of per-bin box counts over all bins.
    BinCountVariance,
}

/// Output locations. Everything is optional; a run without outputs keeps
/// all state in memory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory for per-generation triplots.
    #[serde(default)]
    pub visualization_dir: Option<PathBuf>,
    /// Directory for the per-generation run store.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Parse a configuration from JSON without validating it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read, parse and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of seed points the configured initial mode will produce,
    /// when it can be known without touching the filesystem.
    pub fn seed_count(&self) -> Option<usize> {
        match &self.initial_points {
            InitialPoints::Random { count, .. } => {
                Some(count.unwrap_or(self.children_per_generation))
            }
            InitialPoints::DofCombinations => 1usize.checked_shl(self.degrees_of_freedom as u32),
            InitialPoints::Resume { .. } => None,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dof = self.degrees_of_freedom;
        let required = self.structure.min_degrees_of_freedom();
        if dof < required {
            return Err(ConfigError::TooFewDegreesOfFreedom {
                structure: format!("{:?}", self.structure),
                required,
                actual: dof,
            });
        }

        match self.structure {
            StructureFunction::Donut {
                inner_radius,
                outer_radius,
            }
            | StructureFunction::InverseDonut {
                inner_radius,
                outer_radius,
            } => {
                if !(0.0 <= inner_radius && inner_radius < outer_radius && outer_radius <= 1.0) {
                    return Err(ConfigError::InvalidValue {
                        key: "structure.inner_radius/outer_radius",
                        reason: format!(
                            "need 0 <= inner ({inner_radius}) < outer ({outer_radius}) <= 1"
                        ),
                    });
                }
            }
            StructureFunction::GaussianNorm { sigma, .. } if sigma <= 0.0 => {
                return Err(ConfigError::InvalidValue {
                    key: "structure.sigma",
                    reason: format!("must be positive, got {sigma}"),
                });
            }
            _ => {}
        }

        if self.children_per_generation == 0 {
            return Err(ConfigError::InvalidValue {
                key: "children_per_generation",
                reason: "must be non-zero".to_string(),
            });
        }

        if let Some(count) = self.seed_count()
            && count < 3
        {
            return Err(ConfigError::TooFewSeeds(count));
        }
        if let InitialPoints::DofCombinations = self.initial_points
            && dof > 20
        {
            return Err(ConfigError::InvalidValue {
                key: "initial_points",
                reason: format!("dof_combinations with {dof} dimensions is too large"),
            });
        }

        match &self.generator {
            GeneratorConfig::Random => {}
            GeneratorConfig::ConvexHull {
                selection,
                mutation,
            } => {
                if !(0.0..=1.0).contains(&selection.fraction_hull) {
                    return Err(ConfigError::InvalidValue {
                        key: "generator.selection.fraction_hull",
                        reason: format!("must be in [0, 1], got {}", selection.fraction_hull),
                    });
                }
                if selection.fraction_hull < 1.0 && selection.best_triangles == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "generator.selection.best_triangles",
                        reason: "must be non-zero when simplex sampling is used".to_string(),
                    });
                }
                mutation.validate(dof)?;
            }
            GeneratorConfig::Mutate { mutation } => mutation.validate(dof)?,
        }

        self.binning.validate()?;
        self.stopping.validate()?;

        Ok(())
    }
}

impl MutationConfig {
    fn validate(&self, degrees_of_freedom: usize) -> Result<(), ConfigError> {
        if !(self.initial_strength > 0.0 && self.initial_strength <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "generator.mutation.initial_strength",
                reason: format!("must be in (0, 1], got {}", self.initial_strength),
            });
        }
        if let DofSelection::Subset { count } = self.dofs
            && (count == 0 || count > degrees_of_freedom)
        {
            return Err(ConfigError::InvalidValue {
                key: "generator.mutation.dofs.count",
                reason: format!("must be in 1..={degrees_of_freedom}, got {count}"),
            });
        }
        if self.scheme == MutationScheme::Adaptive {
            let a = &self.adaptive;
            if !(0.0 < a.min_strength && a.min_strength <= a.max_strength && a.max_strength <= 1.0)
            {
                return Err(ConfigError::InvalidValue {
                    key: "generator.mutation.adaptive",
                    reason: format!(
                        "need 0 < min_strength ({}) <= max_strength ({}) <= 1",
                        a.min_strength, a.max_strength
                    ),
                });
            }
            if a.lower_below > a.raise_above {
                return Err(ConfigError::InvalidValue {
                    key: "generator.mutation.adaptive",
                    reason: format!(
                        "lower_below ({}) exceeds raise_above ({})",
                        a.lower_below, a.raise_above
                    ),
                });
            }
        }
        Ok(())
    }
}

impl BinningConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bins == 0 {
            return Err(ConfigError::InvalidValue {
                key: "binning.bins",
                reason: "must be non-zero".to_string(),
            });
        }
        if let Some(schedule) = &self.schedule {
            if schedule.is_empty() || schedule.contains(&0) {
                return Err(ConfigError::InvalidValue {
                    key: "binning.schedule",
                    reason: "must be a non-empty list of non-zero bin counts".to_string(),
                });
            }
            if schedule.windows(2).any(|w| w[1] < w[0]) {
                return Err(ConfigError::InvalidValue {
                    key: "binning.schedule",
                    reason: format!("bin counts must not decrease: {schedule:?}"),
                });
            }
        }
        for (key, (min, max)) in [
            ("binning.x_bounds", self.x_bounds),
            ("binning.y_bounds", self.y_bounds),
        ] {
            if !(min < max) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("min ({min}) must be below max ({max})"),
                });
            }
        }
        Ok(())
    }
}

impl StopConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self
            .benchmarks
            .iter()
            .any(|b| !(*b > 0.0 && *b <= 1.0))
        {
            return Err(ConfigError::InvalidValue {
                key: "stopping.benchmarks",
                reason: format!("fractions must be in (0, 1]: {:?}", self.benchmarks),
            });
        }
        if self.benchmarks.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidValue {
                key: "stopping.benchmarks",
                reason: format!("must be strictly ascending: {:?}", self.benchmarks),
            });
        }
        if let Some(cutoff) = self.convergence_cutoff
            && !(cutoff >= 0.0)
        {
            return Err(ConfigError::InvalidValue {
                key: "stopping.convergence_cutoff",
                reason: format!("must be non-negative, got {cutoff}"),
            });
        }
        Ok(())
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("Structure function {structure} needs at least {required} degrees of freedom, got {actual}")]
    TooFewDegreesOfFreedom {
        structure: String,
        required: usize,
        actual: usize,
    },
    #[error("At least 3 seed points are needed to triangulate, got {0}")]
    TooFewSeeds(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_json() {
        let config = RunConfig::from_json(
            r#"{
                "structure": {"type": "z12"},
                "generator": {"type": "random"},
                "binning": {"bins": 10}
            }"#,
        )
        .unwrap();
        assert_eq!(config.degrees_of_freedom, 3);
        assert_eq!(config.binning.bins, 10);
        assert_eq!(config.initial_points, InitialPoints::DofCombinations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_generator_json() {
        let config = RunConfig::from_json(
            r#"{
                "degrees_of_freedom": 4,
                "structure": {"type": "donut", "inner_radius": 0.3},
                "generator": {
                    "type": "convex_hull",
                    "selection": {"fraction_hull": 0.5, "best_triangles": 5},
                    "mutation": {
                        "policy": "wrapped",
                        "dofs": {"mode": "subset", "count": 2},
                        "scheme": "adaptive",
                        "initial_strength": 0.1
                    }
                },
                "initial_points": {"type": "random", "count": 12, "seed": 7},
                "stopping": {"benchmarks": [0.25, 0.5], "convergence_metric": "bin_count_variance"}
            }"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        let mutation = config.generator.mutation().unwrap();
        assert_eq!(mutation.policy, PerturbationPolicy::Wrapped);
        assert_eq!(mutation.dofs, DofSelection::Subset { count: 2 });
        assert_eq!(mutation.scheme, MutationScheme::Adaptive);
        assert_eq!(config.seed_count(), Some(12));
        assert_eq!(
            config.structure,
            StructureFunction::Donut {
                inner_radius: 0.3,
                outer_radius: 0.9
            }
        );
    }

    #[test]
    fn test_unknown_generator_rejected() {
        let err = RunConfig::from_json(
            r#"{"structure": {"type": "z12"}, "generator": {"type": "simulated_annealing"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("simulated_annealing"));
    }

    #[test]
    fn test_unknown_mutation_scheme_rejected() {
        let err = RunConfig::from_json(
            r#"{
                "structure": {"type": "z12"},
                "generator": {"type": "mutate", "mutation": {"scheme": "gaussian"}}
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("gaussian"));
    }

    #[test]
    fn test_unknown_structure_rejected() {
        let err = RunConfig::from_json(
            r#"{"structure": {"type": "helix"}, "generator": {"type": "random"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("helix"));
    }

    #[test]
    fn test_missing_structure_rejected() {
        let err = RunConfig::from_json(r#"{"generator": {"type": "random"}}"#).unwrap_err();
        assert!(err.to_string().contains("structure"));
    }

    #[test]
    fn test_z12_needs_three_dofs() {
        let config = RunConfig {
            degrees_of_freedom: 2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooFewDegreesOfFreedom { required: 3, .. })
        ));
    }

    #[test]
    fn test_too_few_seeds() {
        let config = RunConfig {
            initial_points: InitialPoints::Random {
                count: Some(2),
                seed: None,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::TooFewSeeds(2))));
    }

    #[test]
    fn test_benchmarks_must_ascend() {
        let mut config = RunConfig::default();
        config.stopping.benchmarks = vec![0.5, 0.25];
        assert!(config.validate().is_err());
        config.stopping.benchmarks = vec![0.25, 1.5];
        assert!(config.validate().is_err());
        config.stopping.benchmarks = vec![0.25, 0.5, 1.0];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subset_larger_than_dofs_rejected() {
        let config = RunConfig {
            generator: GeneratorConfig::Mutate {
                mutation: MutationConfig {
                    dofs: DofSelection::Subset { count: 4 },
                    ..Default::default()
                },
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decreasing_schedule_rejected() {
        let mut config = RunConfig::default();
        config.binning.schedule = Some(vec![10, 5]);
        assert!(config.validate().is_err());
        config.binning.schedule = Some(vec![5, 10, 20]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = RunConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.binning.bins, config.binning.bins);
        assert_eq!(parsed.structure, config.structure);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"structure": {"type": "mean_of_subsets"}, "generator": {"type": "random"}}"#,
        )
        .unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.structure, StructureFunction::MeanOfSubsets);

        let missing = RunConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
