//! Orchestrates a run: validation, seeding, dispatch and reporting.

use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use uuid::Uuid;

use sx_types::{SearchSpace, SxResult};

use crate::config::OptimizationConfig;
use crate::context::SearchContext;
use crate::objective::{Objective, QualityModel};
use crate::observer::{CancellationToken, NoopObserver, RunObserver};
use crate::result::{OptimizationReport, OptimizationResult};
use crate::search::{OptimizationMethod, SearchStrategy};

/// Runs one of the three strategies against an objective.
///
/// The search space and configuration are validated before anything is
/// evaluated. Cancellation through [`cancellation_token`](Self::cancellation_token)
/// stops the run at the next yield point and still returns the best found
/// so far. A token stays cancelled, so use a fresh runner or token per run.
pub struct OptimizationRunner<O = QualityModel> {
    config: OptimizationConfig,
    objective: O,
    cancel: CancellationToken,
}

impl OptimizationRunner<QualityModel> {
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            config,
            objective: QualityModel::new(),
            cancel: CancellationToken::new(),
        }
    }
}

impl Default for OptimizationRunner<QualityModel> {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

impl<O: Objective> OptimizationRunner<O> {
    /// Swap the objective, keeping config and token.
    pub fn with_objective<P: Objective>(self, objective: P) -> OptimizationRunner<P> {
        OptimizationRunner {
            config: self.config,
            objective,
            cancel: self.cancel,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn run(&self, space: &SearchSpace) -> SxResult<OptimizationReport> {
        self.run_with_observer(space, &mut NoopObserver)
    }

    /// Run the method named by `selector` (`"grid"`, `"genetic"` or
    /// `"bayesian"`), overriding the configured one.
    pub fn run_method(
        &self,
        selector: &str,
        space: &SearchSpace,
        observer: &mut dyn RunObserver,
    ) -> SxResult<OptimizationReport> {
        let method: OptimizationMethod = selector.parse()?;
        self.run_as(method, space, observer)
    }

    pub fn run_with_observer(
        &self,
        space: &SearchSpace,
        observer: &mut dyn RunObserver,
    ) -> SxResult<OptimizationReport> {
        self.run_as(self.config.method, space, observer)
    }

    fn run_as(
        &self,
        method: OptimizationMethod,
        space: &SearchSpace,
        observer: &mut dyn RunObserver,
    ) -> SxResult<OptimizationReport> {
        self.config.validate()?;
        let strategy = method.strategy(&self.config);

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        self.run_strategy(strategy.as_ref(), space, observer, &mut rng)
    }

    /// Run an explicit strategy with a caller-supplied random generator.
    ///
    /// The strategy's settings and the space are validated first, so a
    /// misconfigured strategy fails without evaluating anything.
    pub fn run_strategy(
        &self,
        strategy: &dyn SearchStrategy,
        space: &SearchSpace,
        observer: &mut dyn RunObserver,
        rng: &mut dyn RngCore,
    ) -> SxResult<OptimizationReport> {
        strategy.validate()?;
        space.validate()?;
        let budget = strategy.evaluation_budget(space)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            method = %strategy.method(),
            budget,
            parallel = self.config.parallel,
            "optimization run started"
        );

        let mut ctx = SearchContext::new(space, &self.objective, observer, &self.cancel, rng)
            .with_parallel(self.config.parallel);
        if self.cancel.is_cancelled() {
            ctx.checkpoint();
        } else {
            strategy.search(&mut ctx);
        }

        let result =
            OptimizationResult::from_outcome(run_id, strategy.method(), ctx.finish(), started_at);
        info!(
            %run_id,
            evaluations = result.evaluations,
            best = ?result.best_quality,
            cancelled = result.cancelled,
            "optimization run finished"
        );

        Ok(OptimizationReport::new(result, self.config.baseline_quality))
    }
}
