//! Run results and the report handed back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sx_types::{ProcessParameters, SxResult};

use crate::context::SearchOutcome;
use crate::objective::QualityGrade;
use crate::search::OptimizationMethod;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// A point together with its objective value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub params: ProcessParameters,
    pub quality: f64,
}

/// Output of one strategy run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub run_id: RunId,
    pub method: OptimizationMethod,
    /// `None` only when no finite evaluation happened.
    pub best_params: Option<ProcessParameters>,
    pub best_quality: Option<f64>,
    /// Real objective calls, including rejected ones.
    pub evaluations: usize,
    pub rejected_evaluations: usize,
    pub log: Vec<String>,
    /// Stopped early at a cancellation checkpoint.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OptimizationResult {
    pub fn from_outcome(
        run_id: RunId,
        method: OptimizationMethod,
        outcome: SearchOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            method,
            best_params: outcome.best.map(|b| b.params),
            best_quality: outcome.best.map(|b| b.quality),
            evaluations: outcome.evaluations,
            rejected_evaluations: outcome.rejected,
            log: outcome.log,
            cancelled: outcome.cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn best(&self) -> Option<Evaluation> {
        match (self.best_params, self.best_quality) {
            (Some(params), Some(quality)) => Some(Evaluation { params, quality }),
            _ => None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// A finished run plus its comparison against the baseline quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub result: OptimizationResult,
    pub baseline_quality: f64,
    /// `best_quality - baseline_quality`.
    pub improvement: Option<f64>,
    pub grade: Option<QualityGrade>,
}

impl OptimizationReport {
    pub fn new(result: OptimizationResult, baseline_quality: f64) -> Self {
        let improvement = result.best_quality.map(|q| q - baseline_quality);
        let grade = result.best_quality.map(QualityGrade::from_quality);
        Self {
            result,
            baseline_quality,
            improvement,
            grade,
        }
    }

    pub fn to_json(&self) -> SxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
