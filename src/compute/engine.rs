//! The generation loop: seed, then select, mutate, score and bin until a
//! stop condition holds.

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::Path;
use std::time::Instant;

use log::{debug, error, info, warn};
use rayon::prelude::*;

use super::bins::{BinGrid, BinSchedule, BinTracker};
use super::geometry::{GeometryError, Triangulation};
use super::mutation::{Mutator, scheme_strength};
use super::population::{LineageError, Population};
use super::rng::ExplorerRng;
use super::scoring::{ScoringFunction, scoring_function};
use super::selection::{ParentSelector, rare_bin_parents};
use super::strength::MutationStrengthStore;
use crate::render::{Frame, RenderError, SvgPlotter, Visualizer};
use crate::schema::{
    BenchmarkHit, Bin, Candidate, ConfigError, ConvergenceHistory, GenerationRecord, GeneratorConfig,
    InitialPoints, MutationConfig, MutationScheme, Observation, RunConfig, RunPhase, RunProgress,
    RunResult, StopReason, StrengthRecord,
};
use crate::storage::{JsonDirStore, RunStore, StoreError};

/// Children of one generation before scoring, with what produced them.
struct Offspring {
    candidates: Vec<Candidate>,
    parents: Vec<usize>,
    triangulation: Option<Triangulation>,
}

/// Drives one exploration run.
pub struct ExplorationEngine {
    config: RunConfig,
    scorer: Box<dyn ScoringFunction>,
    rng: ExplorerRng,
    population: Population,
    tracker: BinTracker,
    schedule: BinSchedule,
    strengths: MutationStrengthStore,
    history: ConvergenceHistory,
    /// Benchmarks not yet met, ascending.
    benchmarks: VecDeque<f64>,
    benchmarks_hit: Vec<BenchmarkHit>,
    phase: RunPhase,
    /// Generation the seed population belongs to (non-zero after a resume).
    seed_generation: usize,
    /// Last completed generation.
    generation: usize,
    last_new_bins: usize,
    store: Option<Box<dyn RunStore>>,
    visualizer: Option<Box<dyn Visualizer>>,
}

impl ExplorationEngine {
    /// Create an engine from a configuration.
    ///
    /// The configuration is validated here. A run store and a plotter are
    /// attached when the output section names directories for them.
    pub fn new(config: RunConfig) -> Result<Self, ExploreError> {
        config.validate()?;

        let schedule = BinSchedule::from_config(&config.binning, config.number_of_generations);
        let grid = BinGrid {
            bins: schedule.bins_at(0),
            x_bounds: config.binning.x_bounds,
            y_bounds: config.binning.y_bounds,
        };
        let initial_strength = config
            .generator
            .mutation()
            .map_or_else(|| MutationConfig::default().initial_strength, |m| m.initial_strength);

        let store_dir = config.output.store_dir.clone();
        let visualization_dir = config.output.visualization_dir.clone();

        let mut engine = Self {
            scorer: scoring_function(&config.structure),
            rng: ExplorerRng::from_optional(config.random_seed),
            population: Population::new(),
            tracker: BinTracker::new(grid),
            schedule,
            strengths: MutationStrengthStore::new(initial_strength),
            history: ConvergenceHistory::default(),
            benchmarks: config.stopping.benchmarks.iter().copied().collect(),
            benchmarks_hit: Vec::new(),
            phase: RunPhase::Init,
            seed_generation: 0,
            generation: 0,
            last_new_bins: 0,
            store: None,
            visualizer: None,
            config,
        };
        if let Some(dir) = store_dir {
            engine = engine.with_store(Box::new(JsonDirStore::create(dir)?));
        }
        if let Some(dir) = visualization_dir {
            engine = engine.with_visualizer(Box::new(SvgPlotter::new(dir)?));
        }
        Ok(engine)
    }

    /// Replace the scoring function chosen by the configuration.
    pub fn with_scoring_function(mut self, scorer: Box<dyn ScoringFunction>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Mirror every generation into `store`.
    pub fn with_store(mut self, store: Box<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Hand a frame to `visualizer` after every generation.
    pub fn with_visualizer(mut self, visualizer: Box<dyn Visualizer>) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&dyn RunStore> {
        self.store.as_deref()
    }

    pub fn schedule(&self) -> &BinSchedule {
        &self.schedule
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn tracker(&self) -> &BinTracker {
        &self.tracker
    }

    pub fn history(&self) -> &ConvergenceHistory {
        &self.history
    }

    pub fn strengths(&self) -> &MutationStrengthStore {
        &self.strengths
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Last completed generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Generation at which the budget runs out.
    fn final_generation(&self) -> usize {
        self.seed_generation + self.config.number_of_generations
    }

    /// Produce, score and bin the seed population.
    pub fn seed(&mut self) -> Result<(), ExploreError> {
        self.phase = RunPhase::Seeding;
        let dof = self.config.degrees_of_freedom;

        let points: Vec<Vec<f64>> = match &self.config.initial_points {
            InitialPoints::Random { count, seed } => {
                let count = count.unwrap_or(self.config.children_per_generation);
                match seed {
                    Some(s) => {
                        let mut seed_rng = ExplorerRng::new(*s);
                        (0..count).map(|_| seed_rng.unit_point(dof)).collect()
                    }
                    None => (0..count).map(|_| self.rng.unit_point(dof)).collect(),
                }
            }
            InitialPoints::DofCombinations => corner_points(dof),
            InitialPoints::Resume { dir } => {
                let dir = dir.clone();
                return self.resume(&dir);
            }
        };

        info!(
            "Seeding {} points in {dof} dimensions ({})",
            points.len(),
            self.scorer.name()
        );
        let candidates = points.into_iter().map(Candidate::seed).collect();
        let scored = score_candidates(self.scorer.as_ref(), candidates);
        self.population.append_generation(0, scored);
        let new_bins = self.tracker.update(self.population.observations());
        self.seed_generation = 0;
        self.generation = 0;

        self.finish_generation(0, &new_bins, &[], None, Vec::new())
    }

    /// Load the population of a previous run and continue after its last
    /// generation.
    ///
    /// When the attached store is not `dir`, the loaded generations are
    /// committed to it first so it holds the whole run.
    fn resume(&mut self, dir: &Path) -> Result<(), ExploreError> {
        let source = JsonDirStore::open(dir)?;
        let mut records = source.load()?;
        let Some(last) = records.last().map(|r| r.generation) else {
            return Err(StoreError::Empty(dir.to_path_buf()).into());
        };

        let dof = self.config.degrees_of_freedom;
        if let Some(stored) = records
            .iter()
            .flat_map(|r| &r.boxes)
            .find(|b| b.point.len() != dof)
        {
            return Err(ConfigError::InvalidValue {
                key: "initial_points.dir",
                reason: format!(
                    "{} holds {}-dimensional points (box {} of generation {}), \
                     but degrees_of_freedom is {dof}",
                    dir.display(),
                    stored.point.len(),
                    stored.id,
                    stored.generation
                ),
            }
            .into());
        }

        for record in &records {
            self.history.push(
                record.generation,
                record.convergence_score,
                record.coverage,
                (record.coverage * (record.num_bins * record.num_bins) as f64).round() as usize,
                record.num_bins,
            );
            self.strengths.extend_from_records(&record.strengths);
        }
        self.population.extend_from_records(
            records.iter().flat_map(|r| r.boxes.iter().cloned()).collect(),
        )?;
        if matches!(self.config.generator, GeneratorConfig::ConvexHull { .. })
            && self.population.len() < 3
        {
            return Err(ConfigError::TooFewSeeds(self.population.len()).into());
        }

        if let Some(store) = self.store.as_mut()
            && store.location().is_none_or(|to| !same_dir(to, dir))
        {
            for record in &mut records {
                record.boxes = self.population.generation(record.generation).to_vec();
                store.commit_generation(record)?;
            }
            store.commit_history(&self.history)?;
            info!(
                "Copied {} generations from {} into the run store",
                records.len(),
                dir.display()
            );
        }

        self.seed_generation = last;
        self.generation = last;
        self.tracker
            .rebin(self.schedule.bins_at(0), self.population.observations());
        self.last_new_bins = 0;
        self.check_benchmarks();

        info!(
            "Resumed {} boxes through generation {last} from {}: {}/{} bins occupied",
            self.population.len(),
            dir.display(),
            self.tracker.occupied_count(),
            self.tracker.grid().len()
        );
        Ok(())
    }

    /// Run one generation: select, mutate, score, bin, record.
    pub fn step_generation(&mut self) -> Result<(), ExploreError> {
        self.phase = RunPhase::Generating;
        let generation = self.generation + 1;

        let bins = self
            .schedule
            .bins_at(generation - self.seed_generation);
        if bins != self.tracker.bins() {
            info!(
                "Generation {generation}: rebinning {} boxes from {} to {bins} bins per axis",
                self.population.len(),
                self.tracker.bins()
            );
            self.tracker.rebin(bins, self.population.observations());
        }

        let offspring = self.breed(generation)?;
        let scored = score_candidates(self.scorer.as_ref(), offspring.candidates);
        let start = self.population.len();
        self.population.append_generation(generation, scored);
        let new_bins = self
            .tracker
            .update(&self.population.observations()[start..]);
        self.generation = generation;

        let strengths = match self.config.generator.mutation() {
            Some(mutation) if mutation.scheme == MutationScheme::Adaptive => {
                let outcomes = self
                    .population
                    .children_in_parent_bin(generation, self.tracker.assignments());
                self.strengths
                    .adapt(generation, bins, &outcomes, &mutation.adaptive)
            }
            _ => Vec::new(),
        };

        self.finish_generation(
            generation,
            &new_bins,
            &offspring.parents,
            offspring.triangulation.as_ref(),
            strengths,
        )
    }

    /// Produce the unscored children of `generation`.
    fn breed(&mut self, generation: usize) -> Result<Offspring, ExploreError> {
        let count = self.config.children_per_generation;
        let dof = self.config.degrees_of_freedom;
        let generator = self.config.generator.clone();

        match &generator {
            GeneratorConfig::Random => Ok(Offspring {
                candidates: (0..count)
                    .map(|_| Candidate::seed(self.rng.unit_point(dof)))
                    .collect(),
                parents: Vec::new(),
                triangulation: None,
            }),
            GeneratorConfig::ConvexHull {
                selection,
                mutation,
            } => {
                let triangulation = Triangulation::new(self.population.observations())
                    .map_err(|source| ExploreError::Geometry { generation, source })?;
                let parents =
                    ParentSelector::new(selection).select(&triangulation, count, &mut self.rng);
                let candidates = self.mutate_parents(generation, &parents, mutation);
                Ok(Offspring {
                    candidates,
                    parents,
                    triangulation: Some(triangulation),
                })
            }
            GeneratorConfig::Mutate { mutation } => {
                let parents = rare_bin_parents(self.tracker.assignments(), count, &mut self.rng);
                let candidates = self.mutate_parents(generation, &parents, mutation);
                Ok(Offspring {
                    candidates,
                    parents,
                    triangulation: None,
                })
            }
        }
    }

    fn mutate_parents(
        &mut self,
        generation: usize,
        parents: &[usize],
        mutation: &MutationConfig,
    ) -> Vec<Candidate> {
        let mutator = Mutator::from_config(mutation);
        let bins = self.tracker.bins();
        let boxes = self.population.boxes();
        let assignments = self.tracker.assignments();

        parents
            .iter()
            .map(|&parent| {
                let strength =
                    scheme_strength(mutation.scheme, mutation.initial_strength, &mut self.rng)
                        .unwrap_or_else(|| {
                            self.strengths
                                .get_prior(generation, bins, assignments[parent])
                        });
                let point = mutator.mutate(&boxes[parent].point, strength, &mut self.rng);
                Candidate::child_of(parent, point)
            })
            .collect()
    }

    /// Bookkeeping shared by the seed and every later generation.
    fn finish_generation(
        &mut self,
        generation: usize,
        new_bins: &BTreeSet<Bin>,
        parents: &[usize],
        triangulation: Option<&Triangulation>,
        strengths: Vec<StrengthRecord>,
    ) -> Result<(), ExploreError> {
        let coverage = self.tracker.coverage();
        let score = self
            .tracker
            .convergence_score(self.config.stopping.convergence_metric);
        let bins = self.tracker.bins();
        self.history.push(
            generation,
            score,
            coverage,
            self.tracker.occupied_count(),
            bins,
        );
        self.last_new_bins = new_bins.len();

        info!(
            "Generation {generation}: {} boxes, {}/{} bins occupied ({:.1}%), {} new, score {score:.4}",
            self.population.len(),
            self.tracker.occupied_count(),
            self.tracker.grid().len(),
            coverage * 100.0,
            new_bins.len()
        );

        let start = self.population.count_before(generation);
        if let Some(store) = self.store.as_mut() {
            let record = GenerationRecord {
                generation,
                num_bins: bins,
                boxes: self.population.generation(generation).to_vec(),
                bins: self.tracker.assignments()[start..].to_vec(),
                coverage,
                convergence_score: score,
                strengths,
            };
            store.commit_generation(&record)?;
            store.commit_history(&self.history)?;
        }

        if let Some(visualizer) = self.visualizer.as_mut() {
            let children: Vec<usize> = (start..self.population.len()).collect();
            let occupied = self.tracker.occupied();
            let frame = Frame {
                generation,
                observations: self.population.observations(),
                triangulation,
                grid: *self.tracker.grid(),
                children: &children,
                parents,
                occupied: &occupied,
                new_bins,
            };
            match visualizer.render(&frame) {
                Ok(Some(path)) => debug!("Wrote {}", path.display()),
                Ok(None) => {}
                Err(e) => warn!("Generation {generation}: visualization failed: {e}"),
            }
        }

        self.check_benchmarks();
        Ok(())
    }

    /// Pop every pending benchmark the current coverage meets.
    fn check_benchmarks(&mut self) {
        let coverage = self.tracker.coverage();
        while let Some(&benchmark) = self.benchmarks.front()
            && coverage >= benchmark
        {
            self.benchmarks.pop_front();
            info!(
                "Benchmark {:.1}% met at generation {} ({:.1}% covered)",
                benchmark * 100.0,
                self.generation,
                coverage * 100.0
            );
            self.benchmarks_hit.push(BenchmarkHit {
                benchmark,
                generation: self.generation,
                coverage,
            });
        }
    }

    /// Check whether the run should end.
    pub fn should_stop(&self) -> Option<StopReason> {
        if !self.config.stopping.benchmarks.is_empty() && self.benchmarks.is_empty() {
            return Some(StopReason::BenchmarksReached);
        }

        if let Some(cutoff) = self.config.stopping.convergence_cutoff
            && self.history.last_score().is_some_and(|score| score <= cutoff)
        {
            return Some(StopReason::Converged);
        }

        if self.generation >= self.final_generation() {
            return Some(StopReason::GenerationBudget);
        }

        None
    }

    /// Get current progress.
    pub fn progress(&self) -> RunProgress {
        RunProgress {
            phase: self.phase,
            generation: self.generation,
            total_generations: self.final_generation(),
            population: self.population.len(),
            bins: self.tracker.bins(),
            occupied: self.tracker.occupied_count(),
            new_bins: self.last_new_bins,
            coverage: self.tracker.coverage(),
            convergence_score: self.history.last_score().unwrap_or(f64::INFINITY),
        }
    }

    /// Run to completion, reporting progress after seeding and after every
    /// generation.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<RunResult, ExploreError>
    where
        F: FnMut(&RunProgress),
    {
        let start_time = Instant::now();
        match self.run_loop(callback) {
            Ok(stop_reason) => {
                self.phase = RunPhase::Done;
                info!(
                    "Run finished at generation {} ({stop_reason:?}): {:.1}% coverage",
                    self.generation,
                    self.tracker.coverage() * 100.0
                );
                Ok(RunResult {
                    stop_reason,
                    generations: self.generation,
                    total_boxes: self.population.len(),
                    bins: self.tracker.bins(),
                    occupied_bins: self.tracker.occupied().into_iter().collect(),
                    coverage: self.tracker.coverage(),
                    benchmarks_hit: self.benchmarks_hit.clone(),
                    history: self.history.clone(),
                    elapsed_seconds: start_time.elapsed().as_secs_f64(),
                })
            }
            Err(e) => {
                self.phase = RunPhase::Failed;
                error!("Run failed: {e}");
                Err(e)
            }
        }
    }

    fn run_loop<F>(&mut self, mut callback: F) -> Result<StopReason, ExploreError>
    where
        F: FnMut(&RunProgress),
    {
        self.seed()?;
        callback(&self.progress());

        loop {
            self.phase = RunPhase::CheckStop;
            if let Some(reason) = self.should_stop() {
                break Ok(reason);
            }
            self.step_generation()?;
            callback(&self.progress());
        }
    }

    /// Run to completion.
    pub fn run(&mut self) -> Result<RunResult, ExploreError> {
        self.run_with_callback(|_| {})
    }
}

/// Every corner of `{0, 1}^dimensions`, in binary counting order.
pub fn corner_points(dimensions: usize) -> Vec<Vec<f64>> {
    (0..1usize << dimensions)
        .map(|mask| {
            (0..dimensions)
                .map(|k| ((mask >> k) & 1) as f64)
                .collect()
        })
        .collect()
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Score candidates on the rayon pool; output order matches input order.
fn score_candidates(
    scorer: &dyn ScoringFunction,
    candidates: Vec<Candidate>,
) -> Vec<(Candidate, Observation)> {
    candidates
        .into_par_iter()
        .map(|candidate| {
            let observation = scorer.score(&candidate.point);
            (candidate, observation)
        })
        .collect()
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Generation {generation}: {source}")]
    Geometry {
        generation: usize,
        source: GeometryError,
    },
    #[error(transparent)]
    Lineage(#[from] LineageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
