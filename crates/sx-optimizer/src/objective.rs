//! The quality objective all strategies maximize.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use sx_types::{Parameter, ParameterRange, ProcessParameters, SxResult};

/// Anything that scores a point in parameter space. Higher is better.
///
/// Implementations must be pure: the same input always gives the same
/// output, so runs are reproducible and evaluations may be spread across
/// threads.
pub trait Objective: Send + Sync {
    fn evaluate(&self, params: &ProcessParameters) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&ProcessParameters) -> f64 + Send + Sync,
{
    fn evaluate(&self, params: &ProcessParameters) -> f64 {
        self(params)
    }
}

pub const QUALITY_FLOOR: f64 = 300.0;
pub const QUALITY_CEILING: f64 = 400.0;

/// Half-width of the uniform noise added by [`QualityModel::simulate`].
const SIMULATION_NOISE: f64 = 2.0;

/// Normalization domain for each parameter.
pub fn domain(parameter: Parameter) -> (f64, f64) {
    match parameter {
        Parameter::Temperature => (1400.0, 1600.0),
        Parameter::Time => (10.0, 120.0),
        Parameter::Pressure => (95.0, 110.0),
        Parameter::Speed => (250.0, 350.0),
    }
}

/// Map a raw value onto its domain. Values outside the domain extrapolate
/// past `[0, 1]`.
pub fn normalize(parameter: Parameter, value: f64) -> f64 {
    let (lo, hi) = domain(parameter);
    (value - lo) / (hi - lo)
}

/// Surrogate steel quality model on the `[300, 400]` scale.
///
/// Temperature dominates through a nonlinear, non-monotonic term; time
/// peaks near 76 min; pressure is linear; speed has diminishing returns;
/// temperature-time and pressure-speed interact.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityModel;

impl QualityModel {
    pub fn new() -> Self {
        Self
    }

    /// Noise-free quality before the final clamp.
    ///
    /// A temperature below the domain makes the `tempNorm^1.2` term NaN;
    /// callers treat that as a rejected evaluation.
    pub fn raw_quality(&self, params: &ProcessParameters) -> f64 {
        let temp = normalize(Parameter::Temperature, params.temperature);
        let time = normalize(Parameter::Time, params.time);
        let press = normalize(Parameter::Pressure, params.pressure);
        let speed = normalize(Parameter::Speed, params.speed);

        let mut quality = QUALITY_FLOOR;
        quality += 50.0 * temp.powf(1.2) + 20.0 * (temp * PI).sin();
        quality += 30.0 * (1.0 - (time - 0.6).powi(2));
        quality += 15.0 * press;
        quality += 10.0 * speed.max(0.0).sqrt();
        quality += 5.0 * temp * time;
        quality += 3.0 * press * speed;
        quality
    }

    /// Deterministic quality, clamped to `[300, 400]`. This is what the
    /// optimizers call.
    pub fn quality(&self, params: &ProcessParameters) -> f64 {
        clamp_quality(self.raw_quality(params))
    }

    /// Quality with uniform measurement noise in `[-2, 2]`, for simulation
    /// displays. Never used by the optimizers.
    pub fn simulate<R: Rng + ?Sized>(&self, params: &ProcessParameters, rng: &mut R) -> f64 {
        let noise = (rng.random::<f64>() - 0.5) * 2.0 * SIMULATION_NOISE;
        clamp_quality(self.raw_quality(params) + noise)
    }

    /// Sweep one parameter over the grid values of `range`, holding the rest
    /// at `base`. Returns `(value, quality)` pairs.
    pub fn sensitivity(
        &self,
        base: &ProcessParameters,
        parameter: Parameter,
        range: &ParameterRange,
    ) -> SxResult<Vec<(f64, f64)>> {
        Ok(range
            .grid_values()?
            .into_iter()
            .map(|value| (value, self.quality(&base.with(parameter, value))))
            .collect())
    }
}

impl Objective for QualityModel {
    fn evaluate(&self, params: &ProcessParameters) -> f64 {
        self.quality(params)
    }
}

// NaN passes through `clamp` untouched, so the run context can reject it.
fn clamp_quality(quality: f64) -> f64 {
    quality.clamp(QUALITY_FLOOR, QUALITY_CEILING)
}

/// Coarse rating of a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Poor,
}

impl QualityGrade {
    pub fn from_quality(quality: f64) -> Self {
        if quality >= 365.0 {
            Self::Excellent
        } else if quality >= 355.0 {
            Self::Good
        } else {
            Self::Poor
        }
    }
}
