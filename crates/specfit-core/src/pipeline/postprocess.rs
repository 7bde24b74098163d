//! Postprocessing stage: turn a solver outcome plus the preprocessed table
//! into the final results table and the accumulated report metadata.
//!
//! The stage is an explicit ordered list of named steps over a processor
//! struct; the declaration order below is the execution order.

use crate::domain::{SpecFitError, StageResult};
use crate::fitting::components::ComponentEvaluator;
use crate::fitting::{ConfidenceEstimator, ConfidenceReport, FitOutcome};
use crate::pipeline::FitContext;
use crate::pipeline::report::{ReportInput, SortPolicy, fit_report_as_dict};
use crate::statistics::{RegressionDiagnostics, describe_table, pearson_correlation, regression_metrics};
use crate::table::{SpectralTable, SplitFrame};
use faer::Mat;

pub struct PostProcessor<'a> {
    table: SpectralTable,
    outcome: &'a FitOutcome,
    evaluator: &'a dyn ComponentEvaluator,
    estimator: Option<&'a dyn ConfidenceEstimator>,
    context: &'a mut FitContext,
    spectrum_count: Option<usize>,
}

/// Run postprocessing over the preprocessed table and return the final
/// results table; report metadata accumulates into the context.
pub fn run(
    table: SpectralTable,
    outcome: &FitOutcome,
    evaluator: &dyn ComponentEvaluator,
    estimator: Option<&dyn ConfidenceEstimator>,
    context: &mut FitContext,
) -> StageResult<SpectralTable> {
    let mut processor = PostProcessor {
        table,
        outcome,
        evaluator,
        estimator,
        context,
        spectrum_count: None,
    };
    for (name, step) in PostProcessor::steps() {
        tracing::debug!(step = name, "running postprocessing step");
        step(&mut processor)?;
    }
    Ok(processor.table)
}

type StepFn<'a> = fn(&mut PostProcessor<'a>) -> StageResult<()>;

impl<'a> PostProcessor<'a> {
    /// The named postprocessing steps; declaration order is execution order.
    fn steps() -> [(&'static str, StepFn<'a>); 9] {
        [
            ("rename_columns", Self::rename_columns),
            ("infer_spectrum_count", Self::infer_spectrum_count),
            ("insight_report", Self::insight_report),
            ("rebuild_residual_and_fit", Self::rebuild_residual_and_fit),
            ("fit_contributions", Self::fit_contributions),
            ("export_correlation", Self::export_correlation),
            ("export_result", Self::export_result),
            ("export_regression_metrics", Self::export_regression_metrics),
            (
                "export_descriptive_statistics",
                Self::export_descriptive_statistics,
            ),
        ]
    }

    /// Canonicalize column names by position: `energy` + `intensity` for a
    /// single-spectrum fit, `energy` + `intensity_1..N` for a global fit.
    fn rename_columns(&mut self) -> StageResult<()> {
        self.table.rename_at(0, "energy");
        if self.context.settings.global_spectra == 0 {
            self.table.rename_at(1, "intensity");
        } else {
            for position in 1..self.table.column_count() {
                self.table.rename_at(position, format!("intensity_{position}"));
            }
        }
        Ok(())
    }

    /// For a global fit, infer the spectrum count from the largest trailing
    /// numeric suffix across parameter names.
    fn infer_spectrum_count(&mut self) -> StageResult<()> {
        if self.context.settings.global_spectra == 0 {
            return Ok(());
        }
        let count = self.outcome.spectrum_count().ok_or_else(|| {
            SpecFitError::computation(
                "FIT.SPECTRUM_COUNT",
                "global fit requested but no parameter name carries a trailing spectrum suffix",
            )
        })?;
        self.spectrum_count = Some(count);
        Ok(())
    }

    /// Build the insight report; a confidence-interval failure degrades to an
    /// empty report with a diagnostic instead of aborting the pipeline.
    fn insight_report(&mut self) -> StageResult<()> {
        let mut input = ReportInput::new(self.outcome);
        input.min_correlation = self.context.settings.report.min_correlation;
        input.sort = if self.context.settings.report.alphanumeric_sort {
            SortPolicy::Alphanumeric
        } else {
            SortPolicy::Insertion
        };
        self.context.fit_insights = Some(fit_report_as_dict(input)?);

        if let Some(conf_settings) = self.context.settings.conf_interval.clone() {
            let report = match self.estimator {
                Some(estimator) => {
                    match estimator.confidence_interval(self.outcome, &conf_settings) {
                        Ok(report) => report,
                        Err(error) => {
                            tracing::warn!(
                                diagnostic = %error.diagnostic_line(),
                                "confidence-interval estimation failed; storing an empty result"
                            );
                            ConfidenceReport::default()
                        }
                    }
                }
                None => {
                    tracing::warn!(
                        "confidence interval requested but no estimator is available; \
                         storing an empty result"
                    );
                    ConfidenceReport::default()
                }
            };
            self.context.confidence_interval = Some(report);
        }
        Ok(())
    }

    /// Reconstruct residual and fit columns from the flat residual vector.
    fn rebuild_residual_and_fit(&mut self) -> StageResult<()> {
        if self.context.settings.global_spectra == 0 {
            self.rebuild_single()
        } else {
            self.rebuild_global()
        }
    }

    fn rebuild_single(&mut self) -> StageResult<()> {
        let residual = &self.outcome.residual;
        if residual.len() != self.table.row_count() {
            return Err(SpecFitError::computation(
                "FIT.RESIDUAL_SHAPE",
                format!(
                    "residual has {} values but the table has {} rows",
                    residual.len(),
                    self.table.row_count()
                ),
            ));
        }

        let intensity = self
            .table
            .column("intensity")
            .map(|values| values.to_vec())
            .ok_or_else(|| missing_intensity_error("intensity"))?;
        let fit: Vec<f64> = intensity
            .iter()
            .zip(residual)
            .map(|(value, delta)| value + delta)
            .collect();

        self.table.push_column("residual", residual.clone())?;
        self.table.push_column("fit", fit)?;
        Ok(())
    }

    fn rebuild_global(&mut self) -> StageResult<()> {
        let spectra = self.spectrum_count.ok_or_else(|| {
            SpecFitError::internal(
                "SYS.STEP_ORDER",
                "spectrum count missing; inference must run before reconstruction",
            )
        })?;

        let residual = &self.outcome.residual;
        let rows = self.table.row_count();
        if spectra == 0 || residual.len() != spectra * rows {
            return Err(SpecFitError::computation(
                "FIT.RESIDUAL_SHAPE",
                format!(
                    "residual has {} values, expected {} spectra x {} rows",
                    residual.len(),
                    spectra,
                    rows
                ),
            ));
        }

        // Reshape (spectra, rows) then transpose: one column per spectrum,
        // one row per sample index.
        let mut reshaped = Mat::<f64>::zeros(rows, spectra);
        for spectrum in 0..spectra {
            for row in 0..rows {
                reshaped[(row, spectrum)] = residual[spectrum * rows + row];
            }
        }

        for spectrum in 1..=spectra {
            let label = format!("intensity_{spectrum}");
            let intensity = self
                .table
                .column(&label)
                .map(|values| values.to_vec())
                .ok_or_else(|| missing_intensity_error(&label))?;

            let per_spectrum: Vec<f64> =
                (0..rows).map(|row| reshaped[(row, spectrum - 1)]).collect();
            let fit: Vec<f64> = intensity
                .iter()
                .zip(&per_spectrum)
                .map(|(value, delta)| value + delta)
                .collect();

            self.table
                .push_column(format!("residual_{spectrum}"), per_spectrum)?;
            self.table.push_column(format!("fit_{spectrum}"), fit)?;
        }

        let average: Vec<f64> = (0..rows)
            .map(|row| {
                (0..spectra).map(|spectrum| reshaped[(row, spectrum)]).sum::<f64>()
                    / spectra as f64
            })
            .collect();
        self.table.push_column("residual_avg", average)?;
        Ok(())
    }

    /// Append one column per individual model component; existing columns are
    /// never removed or reordered.
    fn fit_contributions(&mut self) -> StageResult<()> {
        let axis = self
            .table
            .column_at(0)
            .map(|(_, values)| values.to_vec())
            .unwrap_or_default();
        let contributions = self
            .evaluator
            .component_contributions(&self.outcome.parameters, &axis)?;
        for (name, values) in contributions {
            self.table.push_column(name, values)?;
        }
        Ok(())
    }

    fn export_correlation(&mut self) -> StageResult<()> {
        self.context.linear_correlation = Some(pearson_correlation(&self.table));
        Ok(())
    }

    fn export_result(&mut self) -> StageResult<()> {
        self.context.fit_result = Some(SplitFrame::from_table(&self.table));
        Ok(())
    }

    /// Regression diagnostics per observed/predicted pair, one column per
    /// spectrum in the split form.
    fn export_regression_metrics(&mut self) -> StageResult<()> {
        let pairs: Vec<(String, String)> = if self.context.settings.global_spectra == 0 {
            vec![("intensity".to_string(), "fit".to_string())]
        } else {
            (1..=self.spectrum_count.unwrap_or(0))
                .map(|spectrum| {
                    (
                        format!("intensity_{spectrum}"),
                        format!("fit_{spectrum}"),
                    )
                })
                .collect()
        };

        let mut labels = Vec::with_capacity(pairs.len());
        let mut per_pair = Vec::with_capacity(pairs.len());
        for (observed_name, predicted_name) in &pairs {
            let observed = self
                .table
                .column(observed_name)
                .ok_or_else(|| missing_intensity_error(observed_name))?;
            let predicted = self
                .table
                .column(predicted_name)
                .ok_or_else(|| missing_intensity_error(predicted_name))?;
            labels.push(predicted_name.clone());
            per_pair.push(regression_metrics(observed, predicted).values());
        }

        let data = (0..RegressionDiagnostics::METRIC_NAMES.len())
            .map(|metric| per_pair.iter().map(|values| values[metric]).collect())
            .collect();

        self.context.regression_metrics = Some(SplitFrame {
            index: RegressionDiagnostics::METRIC_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            columns: labels,
            data,
        });
        Ok(())
    }

    fn export_descriptive_statistics(&mut self) -> StageResult<()> {
        self.context.descriptive_statistic = Some(describe_table(&self.table));
        Ok(())
    }
}

fn missing_intensity_error(name: &str) -> SpecFitError {
    SpecFitError::computation(
        "FIT.INTENSITY_COLUMN",
        format!("expected column '{}' is missing from the results table", name),
    )
}
