mod commands;
mod helpers;

use clap::Parser;
use specfit_core::domain::SpecFitError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let pipeline_error = error.as_pipeline_error();
            eprintln!("{}", pipeline_error.diagnostic_line());
            if let Some(summary_line) = pipeline_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            pipeline_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("specfit-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "specfit-rs", about = "Spectral curve-fitting pipeline")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Apply the preprocessing filters to a spectral table
    Preprocess(commands::PreprocessArgs),
    /// Replay a solver outcome through postprocessing and persistence
    Postprocess(commands::PostprocessArgs),
    /// Print the structured fit report for a solver outcome
    Report(commands::ReportArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Preprocess(args) => commands::run_preprocess_command(args),
        CliCommand::Postprocess(args) => commands::run_postprocess_command(args),
        CliCommand::Report(args) => commands::run_report_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Pipeline(SpecFitError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_pipeline_error(&self) -> SpecFitError {
        match self {
            Self::Usage(message) => {
                SpecFitError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Pipeline(error) => error.clone(),
            Self::Internal(error) => SpecFitError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
