//! Process parameters and the box-constrained search space over them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{SxError, SxResult};

/// Slack used when counting grid steps so that `(max - min) / step` landing a
/// rounding error short of an integer still reaches `max`.
const GRID_EPSILON: f64 = 1e-9;

/// The four tunable process parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Temperature,
    Time,
    Pressure,
    Speed,
}

impl Parameter {
    /// All parameters in enumeration order (temperature-major).
    pub const ALL: [Parameter; 4] = [
        Parameter::Temperature,
        Parameter::Time,
        Parameter::Pressure,
        Parameter::Speed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Time => "time",
            Parameter::Pressure => "pressure",
            Parameter::Speed => "speed",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Time => "min",
            Parameter::Pressure => "kPa",
            Parameter::Speed => "rpm",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One point in parameter space: temperature (°C), time (min),
/// pressure (kPa) and speed (rpm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    pub temperature: f64,
    pub time: f64,
    pub pressure: f64,
    pub speed: f64,
}

impl ProcessParameters {
    pub fn new(temperature: f64, time: f64, pressure: f64, speed: f64) -> Self {
        Self {
            temperature,
            time,
            pressure,
            speed,
        }
    }

    /// Build a point by computing each field from its parameter.
    pub fn from_fn(mut f: impl FnMut(Parameter) -> f64) -> Self {
        Self {
            temperature: f(Parameter::Temperature),
            time: f(Parameter::Time),
            pressure: f(Parameter::Pressure),
            speed: f(Parameter::Speed),
        }
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Time => self.time,
            Parameter::Pressure => self.pressure,
            Parameter::Speed => self.speed,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        match parameter {
            Parameter::Temperature => self.temperature = value,
            Parameter::Time => self.time = value,
            Parameter::Pressure => self.pressure = value,
            Parameter::Speed => self.speed = value,
        }
    }

    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.set(parameter, value);
        self
    }

    pub fn is_finite(&self) -> bool {
        Parameter::ALL.iter().all(|p| self.get(*p).is_finite())
    }
}

impl fmt::Display for ProcessParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T={}, t={}, P={}, V={}",
            self.temperature, self.time, self.pressure, self.speed
        )
    }
}

/// Inclusive bounds and grid step for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Check `min < max` and `step > 0`, all finite.
    pub fn validate(&self, parameter: Parameter) -> SxResult<()> {
        let invalid = |message: String| SxError::InvalidRange {
            parameter: parameter.name().to_string(),
            message,
        };

        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            return Err(invalid(format!(
                "bounds and step must be finite (min {}, max {}, step {})",
                self.min, self.max, self.step
            )));
        }
        if self.min >= self.max {
            return Err(invalid(format!(
                "min {} must be below max {}",
                self.min, self.max
            )));
        }
        if self.step <= 0.0 {
            return Err(invalid(format!("step {} must be positive", self.step)));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Number of grid points: `floor((max - min) / step) + 1`.
    ///
    /// A trailing partial step is never added, so `max` is on the grid only
    /// when the steps land on it exactly.
    ///
    /// Fails with [`SxError::GridTooLarge`] when the count does not fit in
    /// `usize`, e.g. a tiny step over a wide range.
    pub fn grid_len(&self) -> SxResult<usize> {
        let steps = (self.width() / self.step + GRID_EPSILON).floor();
        let too_large = || SxError::GridTooLarge {
            message: format!(
                "range {}..{} with step {} has too many grid points",
                self.min, self.max, self.step
            ),
        };
        if !(steps < usize::MAX as f64) {
            return Err(too_large());
        }
        (steps as usize).checked_add(1).ok_or_else(too_large)
    }

    /// The `index`-th grid value, `min + index * step`.
    pub fn grid_value(&self, index: usize) -> f64 {
        (self.min + index as f64 * self.step).min(self.max)
    }

    pub fn grid_values(&self) -> SxResult<Vec<f64>> {
        Ok((0..self.grid_len()?).map(|i| self.grid_value(i)).collect())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Box constraints for all four parameters. There are no partial spaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub temperature: ParameterRange,
    pub time: ParameterRange,
    pub pressure: ParameterRange,
    pub speed: ParameterRange,
}

impl SearchSpace {
    pub fn new(
        temperature: ParameterRange,
        time: ParameterRange,
        pressure: ParameterRange,
        speed: ParameterRange,
    ) -> Self {
        Self {
            temperature,
            time,
            pressure,
            speed,
        }
    }

    pub fn range(&self, parameter: Parameter) -> &ParameterRange {
        match parameter {
            Parameter::Temperature => &self.temperature,
            Parameter::Time => &self.time,
            Parameter::Pressure => &self.pressure,
            Parameter::Speed => &self.speed,
        }
    }

    pub fn with_range(mut self, parameter: Parameter, range: ParameterRange) -> Self {
        match parameter {
            Parameter::Temperature => self.temperature = range,
            Parameter::Time => self.time = range,
            Parameter::Pressure => self.pressure = range,
            Parameter::Speed => self.speed = range,
        }
        self
    }

    /// Validate every range, reporting the first offending parameter.
    pub fn validate(&self) -> SxResult<()> {
        for parameter in Parameter::ALL {
            self.range(parameter).validate(parameter)?;
        }
        Ok(())
    }

    /// Total number of grid combinations, or an error if it overflows.
    pub fn grid_size(&self) -> SxResult<usize> {
        let mut total: usize = 1;
        for parameter in Parameter::ALL {
            let len = self.range(parameter).grid_len()?;
            total = total.checked_mul(len).ok_or_else(|| SxError::GridTooLarge {
                message: format!("{parameter} adds {len} steps and the product overflows"),
            })?;
        }
        Ok(total)
    }

    pub fn contains(&self, params: &ProcessParameters) -> bool {
        Parameter::ALL
            .iter()
            .all(|p| self.range(*p).contains(params.get(*p)))
    }

    pub fn clamp(&self, params: &ProcessParameters) -> ProcessParameters {
        ProcessParameters::from_fn(|p| self.range(p).clamp(params.get(p)))
    }
}
