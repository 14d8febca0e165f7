//! Industrial operating limits for carbon-steel melting and the checks
//! built on them.

use serde::{Deserialize, Serialize};

use crate::params::{Parameter, ParameterRange, ProcessParameters, SearchSpace};

/// Safe operating envelope for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterLimits {
    pub min: f64,
    pub max: f64,
    /// Default grid step used when building search ranges.
    pub step: f64,
    pub unit: &'static str,
    /// Range usually seen in practice (informational).
    pub typical: &'static str,
}

impl ParameterLimits {
    pub fn for_parameter(parameter: Parameter) -> Self {
        match parameter {
            Parameter::Temperature => Self {
                min: 1400.0,
                max: 1600.0,
                step: 5.0,
                unit: "°C",
                typical: "1450-1550 °C",
            },
            Parameter::Time => Self {
                min: 15.0,
                max: 120.0,
                step: 5.0,
                unit: "min",
                typical: "30-90 min",
            },
            Parameter::Pressure => Self {
                min: 95.0,
                max: 110.0,
                step: 0.5,
                unit: "kPa",
                typical: "98-105 kPa",
            },
            Parameter::Speed => Self {
                min: 250.0,
                max: 350.0,
                step: 5.0,
                unit: "rpm",
                typical: "280-320 rpm",
            },
        }
    }

    pub fn range(&self) -> ParameterRange {
        ParameterRange::new(self.min, self.max, self.step)
    }
}

impl SearchSpace {
    /// The full industrial envelope at its default grid resolution.
    pub fn industrial() -> Self {
        Self::new(
            ParameterLimits::for_parameter(Parameter::Temperature).range(),
            ParameterLimits::for_parameter(Parameter::Time).range(),
            ParameterLimits::for_parameter(Parameter::Pressure).range(),
            ParameterLimits::for_parameter(Parameter::Speed).range(),
        )
    }

    /// Whether every range lies inside the industrial envelope.
    pub fn within_industrial_limits(&self) -> bool {
        Parameter::ALL.iter().all(|p| {
            let limits = ParameterLimits::for_parameter(*p);
            let range = self.range(*p);
            range.min >= limits.min && range.max <= limits.max
        })
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::industrial()
    }
}

/// Why a single value falls outside its industrial limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterViolation {
    NotANumber { parameter: Parameter, corrected: f64 },
    BelowMinimum { parameter: Parameter, value: f64, corrected: f64 },
    AboveMaximum { parameter: Parameter, value: f64, corrected: f64 },
}

impl ParameterViolation {
    pub fn parameter(&self) -> Parameter {
        match self {
            Self::NotANumber { parameter, .. }
            | Self::BelowMinimum { parameter, .. }
            | Self::AboveMaximum { parameter, .. } => *parameter,
        }
    }

    /// The nearest in-limit value.
    pub fn corrected(&self) -> f64 {
        match self {
            Self::NotANumber { corrected, .. }
            | Self::BelowMinimum { corrected, .. }
            | Self::AboveMaximum { corrected, .. } => *corrected,
        }
    }
}

impl std::fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber { parameter, .. } => {
                write!(f, "invalid value for {parameter}: not a number")
            }
            Self::BelowMinimum {
                parameter, value, ..
            } => {
                let limits = ParameterLimits::for_parameter(*parameter);
                write!(
                    f,
                    "{parameter} too low ({value}{unit}), industrial minimum is {min}{unit}",
                    unit = limits.unit,
                    min = limits.min
                )
            }
            Self::AboveMaximum {
                parameter, value, ..
            } => {
                let limits = ParameterLimits::for_parameter(*parameter);
                write!(
                    f,
                    "{parameter} too high ({value}{unit}), industrial maximum is {max}{unit}",
                    unit = limits.unit,
                    max = limits.max
                )
            }
        }
    }
}

/// Check one value against its industrial limits.
pub fn validate_parameter(parameter: Parameter, value: f64) -> Result<(), ParameterViolation> {
    let limits = ParameterLimits::for_parameter(parameter);

    if value.is_nan() {
        return Err(ParameterViolation::NotANumber {
            parameter,
            corrected: limits.min,
        });
    }
    if value < limits.min {
        return Err(ParameterViolation::BelowMinimum {
            parameter,
            value,
            corrected: limits.min,
        });
    }
    if value > limits.max {
        return Err(ParameterViolation::AboveMaximum {
            parameter,
            value,
            corrected: limits.max,
        });
    }
    Ok(())
}

/// Outcome of validating all four parameters at once.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValidation {
    pub violations: Vec<ParameterViolation>,
    /// The input with every violating field replaced by its corrected
    /// value; `None` when nothing needed correcting.
    pub corrected: Option<ProcessParameters>,
}

impl ParameterValidation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn validate_parameters(params: &ProcessParameters) -> ParameterValidation {
    let mut corrected = *params;
    let violations: Vec<ParameterViolation> = Parameter::ALL
        .iter()
        .filter_map(|p| validate_parameter(*p, params.get(*p)).err())
        .inspect(|v| corrected.set(v.parameter(), v.corrected()))
        .collect();

    ParameterValidation {
        corrected: (!violations.is_empty()).then_some(corrected),
        violations,
    }
}

/// Process-safety warnings raised by risky parameter combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationWarning {
    /// Above 1550 °C for more than 80 min.
    ExcessiveEnergy,
    /// Below 1450 °C for less than 30 min.
    IncompleteMelt,
    /// Above 105 kPa at more than 320 rpm.
    EquipmentStress,
    /// Below 98 kPa at more than 300 rpm.
    ProcessInstability,
}

impl CombinationWarning {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ExcessiveEnergy => {
                "high temperature (>1550 °C) with long time (>80 min) wastes energy and may degrade the material"
            }
            Self::IncompleteMelt => {
                "low temperature (<1450 °C) with short time (<30 min) may leave the melt incomplete"
            }
            Self::EquipmentStress => {
                "high pressure (>105 kPa) with high speed (>320 rpm) overstresses the equipment"
            }
            Self::ProcessInstability => {
                "low pressure (<98 kPa) with high speed (>300 rpm) destabilizes the process"
            }
        }
    }
}

pub fn check_combination(params: &ProcessParameters) -> Vec<CombinationWarning> {
    let mut warnings = Vec::new();

    if params.temperature > 1550.0 && params.time > 80.0 {
        warnings.push(CombinationWarning::ExcessiveEnergy);
    }
    if params.temperature < 1450.0 && params.time < 30.0 {
        warnings.push(CombinationWarning::IncompleteMelt);
    }
    if params.pressure > 105.0 && params.speed > 320.0 {
        warnings.push(CombinationWarning::EquipmentStress);
    }
    if params.pressure < 98.0 && params.speed > 300.0 {
        warnings.push(CombinationWarning::ProcessInstability);
    }

    warnings
}
