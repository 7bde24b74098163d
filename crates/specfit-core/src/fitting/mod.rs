//! Solver-boundary contract: parameter and outcome types returned by an
//! external nonlinear least-squares minimizer, plus the traits the pipeline
//! consumes the solver and confidence estimator through.
//!
//! The pipeline never runs an optimizer itself; it interprets a
//! [`FitOutcome`]. The types are deserializable so an outcome produced by a
//! solver in another process can be replayed through postprocessing.

pub mod components;

use crate::domain::{ConfidenceSettings, OrderedMap, SolverOptions, StageResult};
use crate::table::SpectralTable;
use serde::{Deserialize, Serialize};

fn default_vary() -> bool {
    true
}

/// One best-fit parameter as reported by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    pub name: String,
    /// Best-fit value.
    pub value: f64,
    #[serde(default)]
    pub init_value: Option<f64>,
    /// Standard error; absent when the solver could not estimate error bars.
    #[serde(default)]
    pub stderr: Option<f64>,
    /// Constraint expression tying this parameter to others.
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default = "default_vary")]
    pub vary: bool,
    /// Lower bound; absent means unbounded.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound; absent means unbounded.
    #[serde(default)]
    pub max: Option<f64>,
    /// Correlation coefficients against other parameter names.
    #[serde(default)]
    pub correlations: OrderedMap<f64>,
}

impl FitParameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            init_value: None,
            stderr: None,
            expression: None,
            vary: true,
            min: None,
            max: None,
            correlations: OrderedMap::new(),
        }
    }
}

/// Solver-level scalars describing the finished minimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverStatistics {
    pub method: String,
    pub function_evals: usize,
    pub data_points: usize,
    pub variable_count: usize,
    pub degrees_of_freedom: usize,
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub akaike_criterion: f64,
    pub bayesian_criterion: f64,
    /// Whether the solver produced parameter error bars.
    pub errorbars_estimated: bool,
    /// Whether a numerical-differentiation covariance fallback is available
    /// when the method cannot estimate uncertainties natively.
    #[serde(default = "default_vary")]
    pub covariance_fallback: bool,
}

/// Result contract of the external minimizer: the flat residual vector, the
/// parameter list, and optional solver statistics (a bare parameter set
/// carries none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub residual: Vec<f64>,
    pub parameters: Vec<FitParameter>,
    #[serde(default)]
    pub statistics: Option<SolverStatistics>,
}

impl FitOutcome {
    pub fn parameter(&self, name: &str) -> Option<&FitParameter> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// Spectrum count for a global fit: the maximum trailing `_<digits>`
    /// suffix across all parameter names, `None` when no name carries one.
    pub fn spectrum_count(&self) -> Option<usize> {
        self.parameters
            .iter()
            .filter_map(|param| {
                param
                    .name
                    .rsplit_once('_')
                    .and_then(|(_, suffix)| suffix.parse::<usize>().ok())
            })
            .max()
    }
}

/// Model callable handed to the minimizer: evaluate the composite model for a
/// parameter set over the independent axis.
pub trait ObjectiveModel {
    fn evaluate(&self, parameters: &[FitParameter], axis: &[f64]) -> StageResult<Vec<f64>>;
}

/// The external nonlinear least-squares solver boundary.
pub trait Minimizer {
    fn minimize(
        &self,
        model: &dyn ObjectiveModel,
        parameters: &[FitParameter],
        table: &SpectralTable,
        options: &SolverOptions,
    ) -> StageResult<FitOutcome>;
}

/// One bracketed confidence band for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub sigma: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Confidence intervals per parameter; empty when estimation failed or was
/// skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub intervals: OrderedMap<Vec<ConfidenceBand>>,
}

/// Confidence-interval boundary; failure is the recoverable error path and is
/// reported through the `Result`, never by panicking into the pipeline.
pub trait ConfidenceEstimator {
    fn confidence_interval(
        &self,
        outcome: &FitOutcome,
        settings: &ConfidenceSettings,
    ) -> StageResult<ConfidenceReport>;
}
