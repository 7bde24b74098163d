use super::CliError;
use super::helpers::{
    load_outcome, load_settings, load_table, write_csv_artifact,
};
use specfit_core::fitting::components::BuiltinComponents;
use specfit_core::pipeline::report::{ReportInput, SortPolicy, fit_report_as_dict};
use specfit_core::pipeline::{FitContext, persist, postprocess, preprocess};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct PreprocessArgs {
    /// Input spectral table (CSV)
    #[arg(long)]
    input: PathBuf,

    /// Fit settings document (JSON)
    #[arg(long)]
    settings: PathBuf,

    /// Output path for the preprocessed table (CSV)
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct PostprocessArgs {
    /// Preprocessed spectral table (CSV)
    #[arg(long)]
    input: PathBuf,

    /// Serialized solver outcome (JSON)
    #[arg(long)]
    result: PathBuf,

    /// Fit settings document (JSON)
    #[arg(long)]
    settings: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ReportArgs {
    /// Serialized solver outcome (JSON)
    #[arg(long)]
    result: PathBuf,

    /// Minimum correlation magnitude to report
    #[arg(long, default_value_t = 0.1)]
    min_correlation: f64,

    /// Sort variables alphanumerically instead of by insertion order
    #[arg(long)]
    alphanumeric: bool,
}

pub(super) fn run_preprocess_command(args: PreprocessArgs) -> Result<i32, CliError> {
    let settings = load_settings(&args.settings)?;
    let table = load_table(&args.input)?;

    let mut context = FitContext::new(settings);
    let processed = preprocess::run(&table, &mut context).map_err(CliError::Pipeline)?;

    write_csv_artifact(&args.output, &processed)?;

    let statistics = serde_json::to_string_pretty(&context.data_statistic)
        .map_err(|source| CliError::Internal(source.into()))?;
    println!("{statistics}");
    println!(
        "Preprocessed {} rows into '{}'.",
        processed.row_count(),
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_postprocess_command(args: PostprocessArgs) -> Result<i32, CliError> {
    let settings = load_settings(&args.settings)?;
    let table = load_table(&args.input)?;
    let outcome = load_outcome(&args.result)?;

    let selected = preprocess::select_columns(&table, &settings).map_err(CliError::Pipeline)?;

    let mut context = FitContext::new(settings);
    let result = postprocess::run(selected, &outcome, &BuiltinComponents, None, &mut context)
        .map_err(CliError::Pipeline)?;

    let written = persist::save_result(&result, &context).map_err(CliError::Pipeline)?;
    for path in &written {
        println!("Wrote '{}'.", path.display());
    }
    println!(
        "Postprocessing completed for {} rows ({} artifacts).",
        result.row_count(),
        written.len()
    );
    Ok(0)
}

pub(super) fn run_report_command(args: ReportArgs) -> Result<i32, CliError> {
    let outcome = load_outcome(&args.result)?;

    let mut input = ReportInput::new(&outcome);
    input.min_correlation = args.min_correlation;
    input.sort = if args.alphanumeric {
        SortPolicy::Alphanumeric
    } else {
        SortPolicy::Insertion
    };

    let report = fit_report_as_dict(input).map_err(CliError::Pipeline)?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|source| CliError::Internal(source.into()))?;
    println!("{rendered}");
    Ok(0)
}
