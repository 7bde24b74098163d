//! Persistence stage: write the accumulated context and derived tables to
//! durable storage.
//!
//! Four artifacts share the configured base path: `<outfile>_summary.json`,
//! `<outfile>_fit.csv`, `<outfile>_correlation.csv`, `<outfile>_errors.csv`.
//! Writes are per-file best-effort, not transactional: a failure leaves the
//! artifacts written so far in place and aborts with a fatal I/O error.

use crate::domain::{SpecFitError, StageResult};
use crate::pipeline::FitContext;
use crate::pipeline::serialization::{format_float, render_labeled_csv, write_text_artifact};
use crate::table::SpectralTable;
use std::fs;
use std::path::{Path, PathBuf};

const SUMMARY_SUFFIX: &str = "_summary.json";
const FIT_SUFFIX: &str = "_fit.csv";
const CORRELATION_SUFFIX: &str = "_correlation.csv";
const ERRORS_SUFFIX: &str = "_errors.csv";

const CORRELATION_INDEX_LABEL: &str = "attributes";
const ERRORS_INDEX_LABEL: &str = "variables";

/// Write all four artifacts and return their paths in write order.
pub fn save_result(table: &SpectralTable, context: &FitContext) -> StageResult<Vec<PathBuf>> {
    let outfile = context.settings.outfile.as_ref().ok_or_else(|| {
        SpecFitError::io_system(
            "IO.OUTFILE_MISSING",
            "no output filename configured; set 'outfile' before saving results",
        )
    })?;

    if let Some(parent) = outfile.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| {
                SpecFitError::io_system(
                    "IO.OUTPUT_DIR",
                    format!("failed to create output directory '{}': {}", parent.display(), source),
                )
            })?;
        }
    }

    let summary_path = artifact_path(outfile, SUMMARY_SUFFIX);
    let summary = serde_json::to_string_pretty(context).map_err(|source| {
        SpecFitError::internal(
            "SYS.SUMMARY_ENCODE",
            format!("failed to encode the run summary: {source}"),
        )
    })?;
    write_artifact(&summary_path, &summary, "IO.SUMMARY_WRITE")?;

    let fit_path = artifact_path(outfile, FIT_SUFFIX);
    write_artifact(&fit_path, &table.to_csv_string(), "IO.FIT_WRITE")?;

    let correlation = context.linear_correlation.as_ref().ok_or_else(|| {
        SpecFitError::internal(
            "SYS.PERSIST_ORDER",
            "correlation export missing; postprocessing must run before persistence",
        )
    })?;
    let correlation_path = artifact_path(outfile, CORRELATION_SUFFIX);
    write_artifact(
        &correlation_path,
        &render_labeled_csv(
            CORRELATION_INDEX_LABEL,
            &correlation.index,
            &correlation.columns,
            &correlation.data,
        ),
        "IO.CORRELATION_WRITE",
    )?;

    let insights = context.fit_insights.as_ref().ok_or_else(|| {
        SpecFitError::internal(
            "SYS.PERSIST_ORDER",
            "insight report missing; postprocessing must run before persistence",
        )
    })?;
    let errors_path = artifact_path(outfile, ERRORS_SUFFIX);
    write_artifact(&errors_path, &render_errors_csv(insights), "IO.ERRORS_WRITE")?;

    Ok(vec![summary_path, fit_path, correlation_path, errors_path])
}

fn render_errors_csv(insights: &crate::pipeline::report::FitReport) -> String {
    let mut lines = Vec::with_capacity(insights.variables.len() + 1);
    lines.push(format!(
        "{ERRORS_INDEX_LABEL},init_value,model_value,best_value,error_relative,error_absolute"
    ));
    for (name, variable) in insights.variables.iter() {
        lines.push(
            [
                name.to_string(),
                optional_cell(variable.init_value),
                optional_cell(variable.model_value),
                format_float(variable.best_value),
                optional_cell(variable.error_relative),
                optional_cell(variable.error_absolute),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

fn artifact_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_artifact(path: &Path, content: &str, placeholder: &str) -> StageResult<()> {
    write_text_artifact(path, content).map_err(|source| {
        SpecFitError::io_system(
            placeholder,
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}
