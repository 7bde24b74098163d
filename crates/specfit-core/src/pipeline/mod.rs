//! The fitting pipeline: preprocessing, solver invocation, postprocessing,
//! and persistence, executed strictly in that order over a single mutable
//! context owned by one run.

pub mod persist;
pub mod postprocess;
pub mod preprocess;
pub mod report;
pub mod serialization;

use crate::domain::{FitSettings, StageResult};
use crate::fitting::components::ComponentEvaluator;
use crate::fitting::{ConfidenceEstimator, ConfidenceReport, FitParameter, Minimizer, ObjectiveModel};
use crate::statistics::ColumnSummary;
use crate::table::{SpectralTable, SplitFrame};
use report::FitReport;
use serde::Serialize;

/// Accumulated state of one fitting run.
///
/// Each stage writes its outputs into the matching `Option` field; a `None`
/// field means the producing stage has not run. The whole context serializes
/// as the JSON run summary.
#[derive(Debug, Clone, Serialize)]
pub struct FitContext {
    pub settings: FitSettings,
    pub data_statistic: Option<Vec<ColumnSummary>>,
    pub fit_insights: Option<FitReport>,
    pub confidence_interval: Option<ConfidenceReport>,
    pub linear_correlation: Option<SplitFrame>,
    pub fit_result: Option<SplitFrame>,
    pub regression_metrics: Option<SplitFrame>,
    pub descriptive_statistic: Option<Vec<ColumnSummary>>,
}

impl FitContext {
    pub fn new(settings: FitSettings) -> Self {
        Self {
            settings,
            data_statistic: None,
            fit_insights: None,
            confidence_interval: None,
            linear_correlation: None,
            fit_result: None,
            regression_metrics: None,
            descriptive_statistic: None,
        }
    }
}

/// Run the full pipeline short of persistence: preprocess the raw table,
/// hand it to the minimizer, and postprocess the outcome. Persistence stays a
/// separate call so callers can inspect the results before writing.
pub fn run_fit_pipeline(
    minimizer: &dyn Minimizer,
    model: &dyn ObjectiveModel,
    evaluator: &dyn ComponentEvaluator,
    estimator: Option<&dyn ConfidenceEstimator>,
    table: &SpectralTable,
    initial_parameters: &[FitParameter],
    settings: FitSettings,
) -> StageResult<(SpectralTable, FitContext)> {
    let mut context = FitContext::new(settings);

    let prepared = preprocess::run(table, &mut context)?;
    tracing::debug!(rows = prepared.row_count(), "preprocessing finished");

    let outcome = minimizer.minimize(
        model,
        initial_parameters,
        &prepared,
        &context.settings.solver,
    )?;
    tracing::debug!(parameters = outcome.parameters.len(), "solver finished");

    let result = postprocess::run(prepared, &outcome, evaluator, estimator, &mut context)?;
    Ok((result, context))
}
