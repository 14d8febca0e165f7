//! Exhaustive grid search.

use tracing::info;

use sx_types::{Parameter, ProcessParameters, SearchSpace, SxResult};

use crate::config::GridConfig;
use crate::context::SearchContext;
use crate::search::{OptimizationMethod, SearchStrategy};

/// Enumerates every grid point, temperature outermost and speed innermost.
///
/// Each axis runs `min, min + step, ...` while the value stays `<= max`;
/// no trailing partial step is added, so `max` is visited only when the
/// steps land on it. Ties keep the earliest point.
#[derive(Debug, Clone, Default)]
pub struct GridSearch {
    config: GridConfig,
}

impl GridSearch {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }
}

/// Grid values per axis plus mixed-radix decoding of a flat index.
struct Grid {
    axes: [Vec<f64>; 4],
}

impl Grid {
    fn new(space: &SearchSpace) -> SxResult<Self> {
        let [temperature, time, pressure, speed] =
            Parameter::ALL.map(|p| space.range(p).grid_values());
        Ok(Self {
            axes: [temperature?, time?, pressure?, speed?],
        })
    }

    /// Point number `index` in temperature-major order.
    fn point(&self, index: usize) -> ProcessParameters {
        let mut rest = index;
        let mut coords = [0.0; 4];
        for axis in (0..4).rev() {
            let len = self.axes[axis].len();
            coords[axis] = self.axes[axis][rest % len];
            rest /= len;
        }
        ProcessParameters::new(coords[0], coords[1], coords[2], coords[3])
    }
}

impl SearchStrategy for GridSearch {
    fn method(&self) -> OptimizationMethod {
        OptimizationMethod::Grid
    }

    fn validate(&self) -> SxResult<()> {
        self.config.validate()
    }

    fn evaluation_budget(&self, space: &SearchSpace) -> SxResult<usize> {
        space.grid_size()
    }

    fn search(&self, ctx: &mut SearchContext<'_>) {
        let space = *ctx.space();
        let sized = space
            .grid_size()
            .and_then(|total| Ok((total, Grid::new(&space)?)));
        let (total, grid) = match sized {
            Ok(sized) => sized,
            Err(e) => {
                // the runner checks the budget before dispatching
                ctx.log_line(format!("Grid search skipped: {e}"));
                return;
            }
        };
        let batch_size = self.config.yield_every;

        info!(combinations = total, "grid search started");
        ctx.log_line(format!("Grid search started: {total} combinations"));

        let mut start = 0;
        while start < total {
            let end = (start + batch_size).min(total);
            let batch: Vec<ProcessParameters> = (start..end).map(|i| grid.point(i)).collect();
            let qualities = ctx.score(&batch);

            for (params, quality) in batch.into_iter().zip(qualities) {
                if ctx.record(params, quality) {
                    ctx.log_line(format!("New best: Q={quality:.2} at {params}"));
                }
                ctx.progress(ctx.evaluations() as f64 / total as f64);
            }

            start = end;
            if start < total && !ctx.checkpoint() {
                break;
            }
        }

        info!(evaluations = ctx.evaluations(), best = ?ctx.best_quality(), "grid search finished");
        ctx.log_line(format!(
            "Grid search finished: {} evaluations",
            ctx.evaluations()
        ));
    }
}
