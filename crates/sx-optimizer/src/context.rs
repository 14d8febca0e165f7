//! Per-run bookkeeping shared by every strategy.
//!
//! Strategies decide *where* to evaluate; [`SearchContext`] owns everything
//! else: the evaluation counter, the best-so-far, the run log, observer
//! forwarding and cooperative cancellation checkpoints.

use rand::RngCore;
use rayon::prelude::*;
use tracing::{debug, warn};

use sx_types::{ProcessParameters, SearchSpace};

use crate::objective::Objective;
use crate::observer::{CancellationToken, RunObserver};
use crate::result::Evaluation;

pub struct SearchContext<'a> {
    space: &'a SearchSpace,
    objective: &'a dyn Objective,
    observer: &'a mut dyn RunObserver,
    cancel: &'a CancellationToken,
    rng: &'a mut dyn RngCore,
    parallel: bool,
    evaluations: usize,
    rejected: usize,
    best: Option<Evaluation>,
    log: Vec<String>,
    cancelled: bool,
}

/// What a strategy leaves behind once it stops.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub evaluations: usize,
    pub rejected: usize,
    pub best: Option<Evaluation>,
    pub log: Vec<String>,
    pub cancelled: bool,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        space: &'a SearchSpace,
        objective: &'a dyn Objective,
        observer: &'a mut dyn RunObserver,
        cancel: &'a CancellationToken,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            space,
            objective,
            observer,
            cancel,
            rng,
            parallel: false,
            evaluations: 0,
            rejected: 0,
            best: None,
            log: Vec::new(),
            cancelled: false,
        }
    }

    /// Score batches on the rayon pool. Bookkeeping stays serial.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn space(&self) -> &SearchSpace {
        self.space
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn best(&self) -> Option<&Evaluation> {
        self.best.as_ref()
    }

    pub fn best_quality(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.quality)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Evaluate one point and record it. Returns the quality and whether it
    /// became the new best.
    pub fn evaluate(&mut self, params: ProcessParameters) -> (f64, bool) {
        let quality = self.objective.evaluate(&params);
        let improved = self.record(params, quality);
        (quality, improved)
    }

    /// Score a batch without recording anything. Callers must pass each
    /// result to [`record`](Self::record) in batch order.
    pub fn score(&self, batch: &[ProcessParameters]) -> Vec<f64> {
        let objective = self.objective;
        if self.parallel {
            batch.par_iter().map(|p| objective.evaluate(p)).collect()
        } else {
            batch.iter().map(|p| objective.evaluate(p)).collect()
        }
    }

    /// Count one real evaluation and update the best-so-far on a strict
    /// improvement, so the first point to reach a maximum keeps it.
    /// Non-finite qualities are counted but never become the best.
    pub fn record(&mut self, params: ProcessParameters, quality: f64) -> bool {
        debug_assert!(
            self.space.contains(&params),
            "evaluated point {params} lies outside the search space"
        );

        self.evaluations += 1;
        self.observer.on_evaluation(&params, quality);

        if !quality.is_finite() {
            self.rejected += 1;
            warn!(evaluation = self.evaluations, %params, quality, "rejected non-finite evaluation");
            self.log_line(format!(
                "Warning: rejected non-finite quality {quality} at {params}"
            ));
            return false;
        }

        let improved = self.best.as_ref().map_or(true, |b| quality > b.quality);
        if improved {
            debug!(evaluation = self.evaluations, quality, "new best");
            self.best = Some(Evaluation { params, quality });
            self.observer.on_new_best(self.evaluations, &params, quality);
        }
        improved
    }

    pub fn log_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.observer.on_log_line(&line);
        self.log.push(line);
    }

    pub fn progress(&mut self, fraction: f64) {
        self.observer.on_progress(fraction.clamp(0.0, 1.0));
    }

    /// Yield point: give up the thread, then check for cancellation.
    /// Returns `false` once the run should stop.
    pub fn checkpoint(&mut self) -> bool {
        std::thread::yield_now();

        if self.cancelled {
            return false;
        }
        if self.cancel.is_cancelled() {
            self.cancelled = true;
            warn!(evaluations = self.evaluations, "optimization cancelled");
            self.log_line(format!(
                "Run cancelled after {} evaluations",
                self.evaluations
            ));
            return false;
        }
        debug!(evaluations = self.evaluations, "yield point");
        true
    }

    pub fn finish(self) -> SearchOutcome {
        SearchOutcome {
            evaluations: self.evaluations,
            rejected: self.rejected,
            best: self.best,
            log: self.log,
            cancelled: self.cancelled,
        }
    }
}
