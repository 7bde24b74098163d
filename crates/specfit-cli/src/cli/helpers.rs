use super::CliError;
use specfit_core::domain::{FitSettings, SpecFitError};
use specfit_core::fitting::FitOutcome;
use specfit_core::table::SpectralTable;
use std::fs;
use std::path::Path;

pub(super) fn load_settings(path: &Path) -> Result<FitSettings, CliError> {
    let text = read_input(path, "IO.SETTINGS_READ")?;
    serde_json::from_str(&text).map_err(|source| {
        CliError::Pipeline(SpecFitError::input_validation(
            "INPUT.SETTINGS_PARSE",
            format!("failed to parse settings '{}': {}", path.display(), source),
        ))
    })
}

pub(super) fn load_table(path: &Path) -> Result<SpectralTable, CliError> {
    let text = read_input(path, "IO.TABLE_READ")?;
    SpectralTable::from_csv_str(&text).map_err(CliError::Pipeline)
}

pub(super) fn load_outcome(path: &Path) -> Result<FitOutcome, CliError> {
    let text = read_input(path, "IO.RESULT_READ")?;
    serde_json::from_str(&text).map_err(|source| {
        CliError::Pipeline(SpecFitError::input_validation(
            "INPUT.RESULT_PARSE",
            format!(
                "failed to parse solver outcome '{}': {}",
                path.display(),
                source
            ),
        ))
    })
}

pub(super) fn write_csv_artifact(path: &Path, table: &SpectralTable) -> Result<(), CliError> {
    fs::write(path, table.to_csv_string()).map_err(|source| {
        CliError::Pipeline(SpecFitError::io_system(
            "IO.TABLE_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        ))
    })
}

fn read_input(path: &Path, placeholder: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| {
        CliError::Pipeline(SpecFitError::io_system(
            placeholder,
            format!("failed to read '{}': {}", path.display(), source),
        ))
    })
}
