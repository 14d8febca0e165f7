//! Run configuration. Defaults reproduce the reference behavior exactly;
//! every field can be overridden from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use sx_types::{config_error, SxResult};

use crate::search::OptimizationMethod;

/// Unoptimized quality that improvements are reported against.
pub const DEFAULT_BASELINE_QUALITY: f64 = 350.0;

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub method: OptimizationMethod,

    /// Seed for the run's random generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Reference quality for the reported improvement.
    pub baseline_quality: f64,

    /// Score grid batches and GA generations on the rayon pool.
    pub parallel: bool,

    pub grid: GridConfig,
    pub genetic: GeneticConfig,
    pub bayesian: BayesianConfig,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            method: OptimizationMethod::default(),
            seed: None,
            baseline_quality: DEFAULT_BASELINE_QUALITY,
            parallel: false,
            grid: GridConfig::default(),
            genetic: GeneticConfig::default(),
            bayesian: BayesianConfig::default(),
        }
    }
}

impl OptimizationConfig {
    pub fn new(method: OptimizationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_baseline(mut self, baseline_quality: f64) -> Self {
        self.baseline_quality = baseline_quality;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
        self.genetic = genetic;
        self
    }

    pub fn with_bayesian(mut self, bayesian: BayesianConfig) -> Self {
        self.bayesian = bayesian;
        self
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    pub fn from_json_str(json: &str) -> SxResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SxResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> SxResult<()> {
        if !self.baseline_quality.is_finite() {
            return Err(config_error!(
                "baseline_quality must be finite, got {}",
                self.baseline_quality
            ));
        }
        self.grid.validate()?;
        self.genetic.validate()?;
        self.bayesian.validate()
    }
}

/// Exhaustive grid enumeration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Evaluations between yield points.
    pub yield_every: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { yield_every: 100 }
    }
}

impl GridConfig {
    pub fn validate(&self) -> SxResult<()> {
        positive("grid.yield_every", self.yield_every)
    }
}

/// Genetic algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,
    /// Probability that an offspring is a parent blend rather than a copy.
    pub crossover_rate: f64,
    pub tournament_size: usize,
    /// Mutation step as a fraction of each axis width.
    pub mutation_strength: f64,
    /// Generations between yield points.
    pub yield_every: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            tournament_size: 3,
            mutation_strength: 0.1,
            yield_every: 10,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> SxResult<()> {
        positive("genetic.population_size", self.population_size)?;
        positive("genetic.tournament_size", self.tournament_size)?;
        positive("genetic.yield_every", self.yield_every)?;
        probability("genetic.mutation_rate", self.mutation_rate)?;
        probability("genetic.crossover_rate", self.crossover_rate)?;
        if !(self.mutation_strength.is_finite() && self.mutation_strength >= 0.0) {
            return Err(config_error!(
                "genetic.mutation_strength must be a non-negative number, got {}",
                self.mutation_strength
            ));
        }
        self.evaluation_budget().map(|_| ())
    }

    /// `population_size * (generations + 1)`, or an error when that does
    /// not fit in `usize`.
    pub fn evaluation_budget(&self) -> SxResult<usize> {
        self.generations
            .checked_add(1)
            .and_then(|rounds| self.population_size.checked_mul(rounds))
            .ok_or_else(|| {
                config_error!(
                    "genetic budget of {} individuals over {} generations overflows",
                    self.population_size,
                    self.generations
                )
            })
    }
}

/// Surrogate-guided search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianConfig {
    /// Uniform warm-up samples before the surrogate is consulted.
    pub initial_samples: usize,
    /// Guided iterations after warm-up, one real evaluation each.
    pub iterations: usize,
    /// Random candidates scored by the surrogate per iteration.
    pub candidates: usize,
    /// Decay of sample weight with normalized distance, `exp(-decay * d)`.
    pub distance_decay: f64,
    /// UCB exploration coefficient.
    pub exploration: f64,
    pub variance_floor: f64,
    /// Guided iterations between yield points.
    pub yield_every: usize,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            initial_samples: 10,
            iterations: 40,
            candidates: 100,
            distance_decay: 5.0,
            exploration: 2.0,
            variance_floor: 0.1,
            yield_every: 5,
        }
    }
}

impl BayesianConfig {
    pub fn validate(&self) -> SxResult<()> {
        positive("bayesian.initial_samples", self.initial_samples)?;
        positive("bayesian.candidates", self.candidates)?;
        positive("bayesian.yield_every", self.yield_every)?;
        for (name, value) in [
            ("bayesian.distance_decay", self.distance_decay),
            ("bayesian.exploration", self.exploration),
            ("bayesian.variance_floor", self.variance_floor),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(config_error!("{name} must be a non-negative number, got {value}"));
            }
        }
        self.evaluation_budget().map(|_| ())
    }

    pub fn evaluation_budget(&self) -> SxResult<usize> {
        self.initial_samples
            .checked_add(self.iterations)
            .ok_or_else(|| {
                config_error!(
                    "bayesian budget of {} initial samples and {} iterations overflows",
                    self.initial_samples,
                    self.iterations
                )
            })
    }
}

fn positive(name: &str, value: usize) -> SxResult<()> {
    if value == 0 {
        return Err(config_error!("{name} must be positive"));
    }
    Ok(())
}

fn probability(name: &str, value: f64) -> SxResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(config_error!("{name} must be within [0, 1], got {value}"));
    }
    Ok(())
}
