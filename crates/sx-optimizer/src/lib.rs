//! # sx-optimizer
//!
//! Process-parameter optimization for SteelX.
//!
//! Provides the quality objective, three black-box search strategies over a
//! four-dimensional box (exhaustive grid, genetic algorithm, and a
//! surrogate-guided Bayesian search), and a runner that handles validation,
//! seeding, progress callbacks and cooperative cancellation.

mod bayesian;
mod config;
mod context;
mod genetic;
mod grid;
mod objective;
mod observer;
mod result;
mod runner;
mod search;

pub use bayesian::{normalized_distance, BayesianSearch, InverseDistanceSurrogate, Prediction, Sample};
pub use config::{
    BayesianConfig, GeneticConfig, GridConfig, OptimizationConfig, DEFAULT_BASELINE_QUALITY,
};
pub use context::{SearchContext, SearchOutcome};
pub use genetic::{blend, mutate, tournament, GeneticSearch, Individual};
pub use grid::GridSearch;
pub use objective::{
    domain, normalize, Objective, QualityGrade, QualityModel, QUALITY_CEILING, QUALITY_FLOOR,
};
pub use observer::{
    CallbackObserver, CancellationToken, ChannelObserver, NoopObserver, RunEvent, RunObserver,
};
pub use result::{Evaluation, OptimizationReport, OptimizationResult, RunId};
pub use runner::OptimizationRunner;
pub use search::{sample_uniform, OptimizationMethod, SearchStrategy};
