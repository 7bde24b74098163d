//! Column-oriented numeric table for spectral data.
//!
//! Rows are samples along the independent axis; columns are named `f64`
//! vectors of equal length. Transforms never mutate a table in place: each
//! pipeline step takes a table and returns a fresh one.

use crate::domain::{SpecFitError, StageResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralTable {
    columns: Vec<(String, Vec<f64>)>,
}

impl SpectralTable {
    /// Build a table from named columns, validating shape and name uniqueness.
    pub fn new<N: Into<String>>(columns: Vec<(N, Vec<f64>)>) -> StageResult<Self> {
        let columns: Vec<(String, Vec<f64>)> = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();

        if let Some((first_name, first_values)) = columns.first() {
            for (name, values) in &columns {
                if values.len() != first_values.len() {
                    return Err(SpecFitError::input_validation(
                        "INPUT.TABLE_SHAPE",
                        format!(
                            "column '{}' has {} rows but column '{}' has {}",
                            name,
                            values.len(),
                            first_name,
                            first_values.len()
                        ),
                    ));
                }
            }
        }

        for (position, (name, _)) in columns.iter().enumerate() {
            if columns
                .iter()
                .take(position)
                .any(|(earlier, _)| earlier == name)
            {
                return Err(SpecFitError::input_validation(
                    "INPUT.TABLE_DUPLICATE_COLUMN",
                    format!("column name '{}' appears more than once", name),
                ));
            }
        }

        Ok(Self { columns })
    }

    /// Build a table from columns already known to satisfy the shape and
    /// uniqueness invariants (e.g. derived from an existing table).
    pub(crate) fn from_validated(columns: Vec<(String, Vec<f64>)>) -> Self {
        Self { columns }
    }

    /// Parse header + numeric rows from CSV text.
    ///
    /// Any cell that does not parse as a finite-or-not `f64` is a fatal input
    /// error naming the offending column and row.
    pub fn from_csv_str(text: &str) -> StageResult<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or_else(|| {
            SpecFitError::input_validation("INPUT.TABLE_EMPTY", "table text has no header row")
        })?;

        let names: Vec<String> = header.split(',').map(|cell| cell.trim().to_string()).collect();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (row_number, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != names.len() {
                return Err(SpecFitError::input_validation(
                    "INPUT.TABLE_SHAPE",
                    format!(
                        "row {} has {} cells but the header names {} columns",
                        row_number + 1,
                        cells.len(),
                        names.len()
                    ),
                ));
            }
            for (column, cell) in cells.iter().enumerate() {
                let value: f64 = cell.parse().map_err(|_| {
                    SpecFitError::input_validation(
                        "INPUT.TABLE_NUMERIC",
                        format!(
                            "column '{}' row {} holds non-numeric value '{}'",
                            names[column],
                            row_number + 1,
                            cell
                        ),
                    )
                })?;
                values[column].push(value);
            }
        }

        Self::new(names.into_iter().zip(values).collect::<Vec<_>>())
    }

    /// Render the table as CSV text, no index column.
    pub fn to_csv_string(&self) -> String {
        let mut lines = Vec::with_capacity(self.row_count() + 1);
        lines.push(
            self.columns
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        );
        for row in 0..self.row_count() {
            lines.push(
                self.columns
                    .iter()
                    .map(|(_, values)| format!("{}", values[row]))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn column_at(&self, index: usize) -> Option<(&str, &[f64])> {
        self.columns
            .get(index)
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Select columns by name, preserving the requested order.
    pub fn select(&self, names: &[String]) -> StageResult<Self> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let values = self.column(name).ok_or_else(|| {
                SpecFitError::input_validation(
                    "INPUT.COLUMN_SELECTION",
                    format!("selected column '{}' not present in table", name),
                )
            })?;
            selected.push((name.clone(), values.to_vec()));
        }
        Self::new(selected)
    }

    /// Rename the column at `index`; out-of-range positions are ignored.
    pub fn rename_at(&mut self, index: usize, name: impl Into<String>) {
        if let Some(slot) = self.columns.get_mut(index) {
            slot.0 = name.into();
        }
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> StageResult<()> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(SpecFitError::input_validation(
                "INPUT.TABLE_DUPLICATE_COLUMN",
                format!("column name '{}' appears more than once", name),
            ));
        }
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(SpecFitError::input_validation(
                "INPUT.TABLE_SHAPE",
                format!(
                    "column '{}' has {} rows but the table has {}",
                    name,
                    values.len(),
                    self.row_count()
                ),
            ));
        }
        self.columns.push((name, values));
        Ok(())
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let kept: Vec<usize> = (0..self.row_count()).filter(|row| keep(*row)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                (
                    name.clone(),
                    kept.iter().map(|row| values[*row]).collect::<Vec<f64>>(),
                )
            })
            .collect();
        Self { columns }
    }

    /// Replace the values of an existing column, keeping its position.
    pub fn replace_column(&mut self, name: &str, values: Vec<f64>) -> StageResult<()> {
        let row_count = self.row_count();
        let slot = self
            .columns
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .ok_or_else(|| {
                SpecFitError::input_validation(
                    "INPUT.COLUMN_SELECTION",
                    format!("selected column '{}' not present in table", name),
                )
            })?;
        if values.len() != row_count {
            return Err(SpecFitError::input_validation(
                "INPUT.TABLE_SHAPE",
                format!(
                    "column '{}' has {} rows but the table has {}",
                    name,
                    values.len(),
                    row_count
                ),
            ));
        }
        slot.1 = values;
        Ok(())
    }
}

/// Three-part serializable form of a matrix or table: row labels, column
/// labels, and row-major data. Reconstruction is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitFrame {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl SplitFrame {
    pub fn from_table(table: &SpectralTable) -> Self {
        let columns: Vec<String> = table.column_names().map(str::to_string).collect();
        let data = (0..table.row_count())
            .map(|row| {
                (0..table.column_count())
                    .map(|column| {
                        table
                            .column_at(column)
                            .map(|(_, values)| values[row])
                            .unwrap_or(f64::NAN)
                    })
                    .collect()
            })
            .collect();
        Self {
            index: (0..table.row_count()).map(|row| row.to_string()).collect(),
            columns,
            data,
        }
    }

    pub fn to_table(&self) -> StageResult<SpectralTable> {
        let mut columns: Vec<(String, Vec<f64>)> = self
            .columns
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(self.data.len())))
            .collect();
        for (row_number, row) in self.data.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(SpecFitError::input_validation(
                    "INPUT.SPLIT_SHAPE",
                    format!(
                        "split row {} has {} values but {} column labels exist",
                        row_number,
                        row.len(),
                        self.columns.len()
                    ),
                ));
            }
            for (column, value) in row.iter().enumerate() {
                columns[column].1.push(*value);
            }
        }
        SpectralTable::new(columns)
    }
}
