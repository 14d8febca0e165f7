//! Generational genetic algorithm over the continuous box.

use rand::{Rng, RngCore};
use tracing::info;

use sx_types::{Parameter, ProcessParameters, SearchSpace, SxResult};

use crate::config::GeneticConfig;
use crate::context::SearchContext;
use crate::search::{sample_uniform, OptimizationMethod, SearchStrategy};

/// A candidate and its fitness. Rejected evaluations get `-inf` so they
/// lose every tournament.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Individual {
    pub params: ProcessParameters,
    pub fitness: f64,
}

impl Individual {
    fn new(params: ProcessParameters, quality: f64) -> Self {
        let fitness = if quality.is_finite() {
            quality
        } else {
            f64::NEG_INFINITY
        };
        Self { params, fitness }
    }
}

/// Tournament selection, blend crossover and uniform mutation.
///
/// Runs the full generation budget; there is no convergence stop.
#[derive(Debug, Clone, Default)]
pub struct GeneticSearch {
    config: GeneticConfig,
}

impl GeneticSearch {
    pub fn new(config: GeneticConfig) -> Self {
        Self { config }
    }

    /// Score a batch of points and record them in order.
    fn evaluate_population(
        ctx: &mut SearchContext<'_>,
        points: Vec<ProcessParameters>,
    ) -> (Vec<Individual>, bool) {
        let qualities = ctx.score(&points);
        let mut improved = false;
        let population = points
            .into_iter()
            .zip(qualities)
            .map(|(params, quality)| {
                improved |= ctx.record(params, quality);
                Individual::new(params, quality)
            })
            .collect();
        (population, improved)
    }

    fn breed(
        &self,
        population: &[Individual],
        space: &SearchSpace,
        rng: &mut dyn RngCore,
    ) -> ProcessParameters {
        let parent1 = tournament(population, self.config.tournament_size, rng);
        let parent2 = tournament(population, self.config.tournament_size, rng);

        let mut offspring = if rng.random::<f64>() < self.config.crossover_rate {
            blend(&parent1.params, &parent2.params, rng.random::<f64>())
        } else {
            parent1.params
        };

        if rng.random::<f64>() < self.config.mutation_rate {
            offspring = mutate(&offspring, space, self.config.mutation_strength, rng);
        }

        space.clamp(&offspring)
    }
}

/// Pick `size` individuals at random (with replacement) and keep the
/// fittest; the first drawn wins ties.
pub fn tournament<'p>(
    population: &'p [Individual],
    size: usize,
    rng: &mut dyn RngCore,
) -> &'p Individual {
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..size {
        let competitor = &population[rng.random_range(0..population.len())];
        if competitor.fitness > best.fitness {
            best = competitor;
        }
    }
    best
}

/// `alpha * a + (1 - alpha) * b` on every field, one `alpha` for all.
pub fn blend(a: &ProcessParameters, b: &ProcessParameters, alpha: f64) -> ProcessParameters {
    ProcessParameters::from_fn(|p| alpha * a.get(p) + (1.0 - alpha) * b.get(p))
}

/// Shift every field by `(u - 0.5) * width * strength`, `u` drawn per field.
/// The result is not clamped.
pub fn mutate(
    params: &ProcessParameters,
    space: &SearchSpace,
    strength: f64,
    rng: &mut dyn RngCore,
) -> ProcessParameters {
    ProcessParameters::from_fn(|p: Parameter| {
        params.get(p) + (rng.random::<f64>() - 0.5) * space.range(p).width() * strength
    })
}

fn fittest(population: &[Individual]) -> Option<&Individual> {
    population.iter().fold(None, |best: Option<&Individual>, current| match best {
        Some(b) if current.fitness <= b.fitness => Some(b),
        _ => Some(current),
    })
}

impl SearchStrategy for GeneticSearch {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::Genetic
    }

    fn validate(&self) -> SxResult<()> {
        self.config.validate()
    }

    fn evaluation_budget(&self, _space: &SearchSpace) -> SxResult<usize> {
        self.config.evaluation_budget()
    }

    fn search(&self, ctx: &mut SearchContext<'_>) {
        let space = *ctx.space();
        let size = self.config.population_size;
        let generations = self.config.generations;

        info!(population = size, generations, "genetic algorithm started");
        ctx.log_line(format!(
            "Genetic algorithm started: {size} individuals, {generations} generations"
        ));

        let initial: Vec<ProcessParameters> =
            (0..size).map(|_| sample_uniform(&space, ctx.rng())).collect();
        let (mut population, _) = Self::evaluate_population(ctx, initial);

        if let Some(best) = fittest(&population) {
            ctx.log_line(format!(
                "Initial population: best fitness = {:.2}",
                best.fitness
            ));
        }

        for generation in 1..=generations {
            let offspring: Vec<ProcessParameters> = (0..size)
                .map(|_| self.breed(&population, &space, ctx.rng()))
                .collect();
            let (next, improved) = Self::evaluate_population(ctx, offspring);
            population = next;

            if improved {
                if let Some(best) = ctx.best_quality() {
                    ctx.log_line(format!("Generation {generation}: new best = {best:.2}"));
                }
            }

            ctx.progress(generation as f64 / generations as f64);

            if generation < generations
                && generation % self.config.yield_every == 0
                && !ctx.checkpoint()
            {
                break;
            }
        }

        info!(evaluations = ctx.evaluations(), best = ?ctx.best_quality(), "genetic algorithm finished");
        ctx.log_line(format!(
            "Genetic algorithm finished: {} evaluations",
            ctx.evaluations()
        ));
    }
}
