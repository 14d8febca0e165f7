//! Strategy selection and the trait every strategy implements.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sx_types::{Parameter, ProcessParameters, SearchSpace, SxError, SxResult};

use crate::bayesian::BayesianSearch;
use crate::config::OptimizationConfig;
use crate::context::SearchContext;
use crate::genetic::GeneticSearch;
use crate::grid::GridSearch;

/// Which search strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMethod {
    #[serde(alias = "grid_search")]
    Grid,
    Genetic,
    Bayesian,
}

impl OptimizationMethod {
    /// The selector string accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Genetic => "genetic",
            Self::Bayesian => "bayesian",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Grid => "Grid Search",
            Self::Genetic => "Genetic Algorithm",
            Self::Bayesian => "Bayesian Optimization",
        }
    }

    /// Instantiate the strategy with its settings from `config`.
    pub fn strategy(&self, config: &OptimizationConfig) -> Box<dyn SearchStrategy> {
        match self {
            Self::Grid => Box::new(GridSearch::new(config.grid.clone())),
            Self::Genetic => Box::new(GeneticSearch::new(config.genetic.clone())),
            Self::Bayesian => Box::new(BayesianSearch::new(config.bayesian.clone())),
        }
    }
}

impl Default for OptimizationMethod {
    fn default() -> Self {
        Self::Grid
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationMethod {
    type Err = SxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" | "grid_search" => Ok(Self::Grid),
            "genetic" => Ok(Self::Genetic),
            "bayesian" => Ok(Self::Bayesian),
            _ => Err(SxError::UnknownMethod(s.to_string())),
        }
    }
}

/// Common trait for all search strategies.
///
/// A strategy drives evaluations through the [`SearchContext`], which
/// does the counting, best tracking, logging and cancellation. The search
/// space has already been validated when `search` is called.
pub trait SearchStrategy: Send + Sync {
    fn method(&self) -> OptimizationMethod;

    /// Human-readable strategy name.
    fn name(&self) -> &str {
        self.method().display_name()
    }

    /// Check the strategy's own settings. Called before any evaluation.
    fn validate(&self) -> SxResult<()>;

    /// Number of objective evaluations a full, uncancelled run performs.
    fn evaluation_budget(&self, space: &SearchSpace) -> SxResult<usize>;

    fn search(&self, ctx: &mut SearchContext<'_>);
}

/// Draw a point uniformly from the box: `min + u * (max - min)` per axis
/// with `u` in `[0, 1)`.
pub fn sample_uniform(space: &SearchSpace, rng: &mut dyn RngCore) -> ProcessParameters {
    ProcessParameters::from_fn(|p: Parameter| {
        let range = space.range(p);
        range.min + rng.random::<f64>() * range.width()
    })
}
