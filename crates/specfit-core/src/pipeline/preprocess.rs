//! Preprocessing stage: column selection, descriptive statistics of the raw
//! table, then four order-fixed conditional filters (range selection, energy
//! shift, oversampling, smoothing). Every filter takes a table and returns a
//! fresh one; the input is never mutated.

use crate::domain::{FitSettings, SpecFitError, StageResult};
use crate::numerics::{
    NumericsError, OVERSAMPLING_FACTOR, boxcar_smooth, interpolate_linear, resample_even_grid,
};
use crate::pipeline::FitContext;
use crate::statistics::describe_table;
use crate::table::SpectralTable;

/// Run the full preprocessing stage, recording descriptive statistics of the
/// original selected table before any filter is applied.
pub fn run(table: &SpectralTable, context: &mut FitContext) -> StageResult<SpectralTable> {
    let settings = context.settings.clone();
    let selected = select_columns(table, &settings)?;

    context.data_statistic = Some(describe_table(&selected));

    let ranged = energy_range(&selected, &settings)?;
    let shifted = energy_shift(&ranged, &settings);
    let resampled = oversample(&shifted, &settings)?;
    intensity_smooth(&resampled, &settings)
}

/// Select the configured columns and validate the count against the fit mode:
/// a single-spectrum fit takes exactly energy + intensity, a global fit takes
/// energy + one intensity column per spectrum.
pub fn select_columns(table: &SpectralTable, settings: &FitSettings) -> StageResult<SpectralTable> {
    if settings.columns.is_empty() {
        return Err(SpecFitError::input_validation(
            "INPUT.COLUMN_SELECTION",
            "column selection is empty; configure 'columns' with the axis first",
        ));
    }

    let selected = table.select(&settings.columns)?;

    if settings.global_spectra == 0 {
        if selected.column_count() != 2 {
            return Err(SpecFitError::input_validation(
                "INPUT.COLUMN_COUNT",
                format!(
                    "single-spectrum fit expects 2 selected columns, got {}",
                    selected.column_count()
                ),
            ));
        }
    } else if selected.column_count() != settings.global_spectra + 1 {
        return Err(SpecFitError::input_validation(
            "INPUT.COLUMN_COUNT",
            format!(
                "global fit over {} spectra expects {} selected columns, got {}",
                settings.global_spectra,
                settings.global_spectra + 1,
                selected.column_count()
            ),
        ));
    }

    Ok(selected)
}

/// Retain rows whose axis value lies within the configured bounds
/// (inclusive). A single bound filters alone; no bounds passes the table
/// through unchanged.
pub fn energy_range(table: &SpectralTable, settings: &FitSettings) -> StageResult<SpectralTable> {
    let (start, stop) = (settings.energy_start, settings.energy_stop);
    if start.is_none() && stop.is_none() {
        return Ok(table.clone());
    }

    let axis = axis_values(table)?;
    Ok(table.filter_rows(|row| {
        let value = axis[row];
        start.map(|bound| value >= bound).unwrap_or(true)
            && stop.map(|bound| value <= bound).unwrap_or(true)
    }))
}

/// Add the configured shift to every axis value; dependent columns are
/// untouched. A zero shift is a no-op.
pub fn energy_shift(table: &SpectralTable, settings: &FitSettings) -> SpectralTable {
    if settings.shift == 0.0 {
        return table.clone();
    }

    let columns = (0..table.column_count())
        .filter_map(|index| table.column_at(index))
        .enumerate()
        .map(|(position, (name, values))| {
            let values = if position == 0 {
                values.iter().map(|value| value + settings.shift).collect()
            } else {
                values.to_vec()
            };
            (name.to_string(), values)
        })
        .collect();
    SpectralTable::from_validated(columns)
}

/// Resample the table to five times its row count on an evenly spaced axis
/// spanning the original range, interpolating every dependent column.
pub fn oversample(table: &SpectralTable, settings: &FitSettings) -> StageResult<SpectralTable> {
    if !settings.oversampling {
        return Ok(table.clone());
    }

    let axis = axis_values(table)?;
    let grid =
        resample_even_grid(&axis, OVERSAMPLING_FACTOR).map_err(numerics_to_pipeline_error)?;

    let axis_name = table
        .column_at(0)
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();

    let mut columns: Vec<(String, Vec<f64>)> = vec![(axis_name, grid.clone())];
    for index in 1..table.column_count() {
        if let Some((name, values)) = table.column_at(index) {
            let mut resampled = Vec::with_capacity(grid.len());
            for query in &grid {
                resampled.push(
                    interpolate_linear(&axis, values, *query)
                        .map_err(numerics_to_pipeline_error)?,
                );
            }
            columns.push((name.to_string(), resampled));
        }
    }
    SpectralTable::new(columns)
}

/// Boxcar-smooth every intensity column with the configured window; the axis
/// column is untouched. A zero window disables smoothing.
pub fn intensity_smooth(table: &SpectralTable, settings: &FitSettings) -> StageResult<SpectralTable> {
    if settings.smooth == 0 {
        return Ok(table.clone());
    }

    let mut smoothed = table.clone();
    for index in 1..table.column_count() {
        if let Some((name, values)) = table.column_at(index) {
            let window = boxcar_smooth(values, settings.smooth).map_err(numerics_to_pipeline_error)?;
            let name = name.to_string();
            smoothed.replace_column(&name, window)?;
        }
    }
    Ok(smoothed)
}

fn axis_values(table: &SpectralTable) -> StageResult<Vec<f64>> {
    table
        .column_at(0)
        .map(|(_, values)| values.to_vec())
        .ok_or_else(|| {
            SpecFitError::input_validation(
                "INPUT.COLUMN_SELECTION",
                "table has no columns; the independent axis is missing",
            )
        })
}

fn numerics_to_pipeline_error(source: NumericsError) -> SpecFitError {
    SpecFitError::computation("FIT.PREPROCESS_NUMERICS", source.to_string())
}
