//! Surrogate-guided search with an inverse-distance-weighted surrogate and
//! an upper-confidence-bound acquisition rule.
//!
//! The surrogate is deliberately crude (not a Gaussian process): the mean is
//! a distance-weighted average of observed qualities and the variance is
//! `max(floor, 1 / Σw)`, which shrinks as samples accumulate nearby.

use tracing::info;

use sx_types::{Parameter, ProcessParameters, SearchSpace, SxResult};

use crate::config::BayesianConfig;
use crate::context::SearchContext;
use crate::search::{sample_uniform, OptimizationMethod, SearchStrategy};

/// An observed point. Only finite qualities are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub params: ProcessParameters,
    pub quality: f64,
}

/// Surrogate estimate at a candidate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub mean: f64,
    pub variance: f64,
}

impl Prediction {
    pub fn upper_confidence_bound(&self, exploration: f64) -> f64 {
        self.mean + exploration * self.variance.sqrt()
    }
}

/// Euclidean distance after dividing each axis difference by the axis width.
pub fn normalized_distance(a: &ProcessParameters, b: &ProcessParameters, space: &SearchSpace) -> f64 {
    Parameter::ALL
        .iter()
        .map(|p| {
            let d = (a.get(*p) - b.get(*p)) / space.range(*p).width();
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseDistanceSurrogate {
    pub distance_decay: f64,
    pub variance_floor: f64,
}

impl InverseDistanceSurrogate {
    /// `None` when there are no samples to weigh.
    pub fn predict(
        &self,
        samples: &[Sample],
        candidate: &ProcessParameters,
        space: &SearchSpace,
    ) -> Option<Prediction> {
        let (weight_sum, weighted_quality) =
            samples.iter().fold((0.0, 0.0), |(ws, wq), sample| {
                let distance = normalized_distance(&sample.params, candidate, space);
                let weight = (-self.distance_decay * distance).exp();
                (ws + weight, wq + weight * sample.quality)
            });

        if weight_sum <= 0.0 {
            return None;
        }
        Some(Prediction {
            mean: weighted_quality / weight_sum,
            variance: (1.0 / weight_sum).max(self.variance_floor),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BayesianSearch {
    config: BayesianConfig,
}

impl BayesianSearch {
    pub fn new(config: BayesianConfig) -> Self {
        Self { config }
    }

    fn surrogate(&self) -> InverseDistanceSurrogate {
        InverseDistanceSurrogate {
            distance_decay: self.config.distance_decay,
            variance_floor: self.config.variance_floor,
        }
    }

    /// Draw candidates and return the one with the highest acquisition
    /// score; the first candidate wins ties. With no samples yet the first
    /// candidate is taken as is.
    fn propose(&self, ctx: &mut SearchContext<'_>, samples: &[Sample]) -> ProcessParameters {
        let space = *ctx.space();
        let surrogate = self.surrogate();

        let mut best: Option<(ProcessParameters, f64)> = None;
        for _ in 0..self.config.candidates {
            let candidate = sample_uniform(&space, ctx.rng());
            let score = surrogate
                .predict(samples, &candidate, &space)
                .map_or(f64::INFINITY, |p| p.upper_confidence_bound(self.config.exploration));

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        // candidates >= 1 is enforced by the config
        best.map_or_else(|| sample_uniform(&space, ctx.rng()), |(p, _)| p)
    }
}

impl SearchStrategy for BayesianSearch {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::Bayesian
    }

    fn validate(&self) -> SxResult<()> {
        self.config.validate()
    }

    fn evaluation_budget(&self, _space: &SearchSpace) -> SxResult<usize> {
        self.config.evaluation_budget()
    }

    fn search(&self, ctx: &mut SearchContext<'_>) {
        let space = *ctx.space();
        let iterations = self.config.iterations;
        let total = self.config.initial_samples.saturating_add(iterations);
        let mut samples: Vec<Sample> = Vec::new();

        info!(
            initial_samples = self.config.initial_samples,
            iterations = self.config.iterations,
            candidates = self.config.candidates,
            "bayesian optimization started"
        );
        ctx.log_line(format!("Bayesian optimization started: {total} iterations"));

        for _ in 0..self.config.initial_samples {
            let params = sample_uniform(&space, ctx.rng());
            let (quality, _) = ctx.evaluate(params);
            if quality.is_finite() {
                samples.push(Sample { params, quality });
            }
            ctx.progress(ctx.evaluations() as f64 / total as f64);
        }

        if let Some(best) = ctx.best_quality() {
            ctx.log_line(format!("Initial samples: best quality = {best:.2}"));
        }

        for iteration in 1..=iterations {
            let params = self.propose(ctx, &samples);
            let (quality, improved) = ctx.evaluate(params);
            if quality.is_finite() {
                samples.push(Sample { params, quality });
            }
            if improved {
                ctx.log_line(format!("Iteration {iteration}: new best = {quality:.2}"));
            }

            ctx.progress(ctx.evaluations() as f64 / total as f64);

            if iteration < iterations
                && iteration % self.config.yield_every == 0
                && !ctx.checkpoint()
            {
                break;
            }
        }

        info!(evaluations = ctx.evaluations(), best = ?ctx.best_quality(), "bayesian optimization finished");
        ctx.log_line(format!(
            "Bayesian optimization finished: {} evaluations",
            ctx.evaluations()
        ));
    }
}
