//! Descriptive statistics, Pearson correlation, and regression diagnostics
//! over spectral tables.

use crate::table::{SpectralTable, SplitFrame};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Decile levels reported by [`describe_table`].
pub const DECILE_LEVELS: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Summary statistics for one table column: count, mean, sample standard
/// deviation, min, the nine deciles, and max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub deciles: Vec<f64>,
    pub max: f64,
}

/// Decile + summary statistics for every column of the table.
pub fn describe_table(table: &SpectralTable) -> Vec<ColumnSummary> {
    (0..table.column_count())
        .filter_map(|index| table.column_at(index))
        .map(|(name, values)| summarize_column(name, values))
        .collect()
}

fn summarize_column(name: &str, values: &[f64]) -> ColumnSummary {
    let count = values.len();
    let mean = mean(values);

    let std_dev = if count < 2 {
        f64::NAN
    } else {
        let sum_squares: f64 = values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum();
        (sum_squares / (count - 1) as f64).sqrt()
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let deciles = DECILE_LEVELS
        .iter()
        .map(|level| quantile_linear(&sorted, *level))
        .collect();

    ColumnSummary {
        column: name.to_string(),
        count,
        mean,
        std_dev,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        deciles,
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Quantile with linear interpolation between closest ranks.
fn quantile_linear(sorted: &[f64], level: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = level * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Pearson linear correlation matrix over all columns of the table, in the
/// three-part split form (labels on both axes are the column names).
///
/// A zero-variance column correlates as NaN against everything, itself
/// included, matching the undefined-ratio convention.
pub fn pearson_correlation(table: &SpectralTable) -> SplitFrame {
    let names: Vec<String> = table.column_names().map(str::to_string).collect();
    let size = names.len();

    let mut matrix = Mat::<f64>::zeros(size, size);
    for row in 0..size {
        for column in 0..size {
            let left = table.column_at(row).map(|(_, values)| values);
            let right = table.column_at(column).map(|(_, values)| values);
            matrix[(row, column)] = match (left, right) {
                (Some(left), Some(right)) => pearson_pair(left, right),
                _ => f64::NAN,
            };
        }
    }

    let data = (0..size)
        .map(|row| (0..size).map(|column| matrix[(row, column)]).collect())
        .collect();

    SplitFrame {
        index: names.clone(),
        columns: names,
        data,
    }
}

fn pearson_pair(left: &[f64], right: &[f64]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return f64::NAN;
    }
    let mean_left = mean(left);
    let mean_right = mean(right);

    let mut covariance = 0.0;
    let mut variance_left = 0.0;
    let mut variance_right = 0.0;
    for (x, y) in left.iter().zip(right) {
        let dx = x - mean_left;
        let dy = y - mean_right;
        covariance += dx * dy;
        variance_left += dx * dx;
        variance_right += dy * dy;
    }

    let denominator = (variance_left * variance_right).sqrt();
    if denominator == 0.0 {
        return f64::NAN;
    }
    covariance / denominator
}

/// Regression diagnostics between an observed and a predicted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionDiagnostics {
    pub explained_variance: f64,
    pub r_squared: f64,
    pub max_error: f64,
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub root_mean_squared_error: f64,
    pub median_absolute_error: f64,
}

impl RegressionDiagnostics {
    pub const METRIC_NAMES: [&'static str; 7] = [
        "explained_variance",
        "r_squared",
        "max_error",
        "mean_absolute_error",
        "mean_squared_error",
        "root_mean_squared_error",
        "median_absolute_error",
    ];

    pub fn values(&self) -> [f64; 7] {
        [
            self.explained_variance,
            self.r_squared,
            self.max_error,
            self.mean_absolute_error,
            self.mean_squared_error,
            self.root_mean_squared_error,
            self.median_absolute_error,
        ]
    }
}

/// Compute regression diagnostics for one observed/predicted pair.
pub fn regression_metrics(observed: &[f64], predicted: &[f64]) -> RegressionDiagnostics {
    if observed.len() != predicted.len() || observed.is_empty() {
        return RegressionDiagnostics {
            explained_variance: f64::NAN,
            r_squared: f64::NAN,
            max_error: f64::NAN,
            mean_absolute_error: f64::NAN,
            mean_squared_error: f64::NAN,
            root_mean_squared_error: f64::NAN,
            median_absolute_error: f64::NAN,
        };
    }

    let count = observed.len() as f64;
    let residuals: Vec<f64> = observed
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| y - y_hat)
        .collect();

    let observed_mean = mean(observed);
    let total_variance: f64 = observed
        .iter()
        .map(|y| (y - observed_mean) * (y - observed_mean))
        .sum();
    let residual_squares: f64 = residuals.iter().map(|r| r * r).sum();

    let residual_mean = mean(&residuals);
    let residual_variance: f64 = residuals
        .iter()
        .map(|r| (r - residual_mean) * (r - residual_mean))
        .sum();

    let r_squared = if total_variance == 0.0 {
        if residual_squares == 0.0 { 1.0 } else { f64::NAN }
    } else {
        1.0 - residual_squares / total_variance
    };
    let explained_variance = if total_variance == 0.0 {
        if residual_variance == 0.0 { 1.0 } else { f64::NAN }
    } else {
        1.0 - residual_variance / total_variance
    };

    let mut absolute: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    absolute.sort_by(f64::total_cmp);

    let mean_squared_error = residual_squares / count;

    RegressionDiagnostics {
        explained_variance,
        r_squared,
        max_error: absolute.last().copied().unwrap_or(f64::NAN),
        mean_absolute_error: absolute.iter().sum::<f64>() / count,
        mean_squared_error,
        root_mean_squared_error: mean_squared_error.sqrt(),
        median_absolute_error: quantile_linear(&absolute, 0.5),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{
        DECILE_LEVELS, RegressionDiagnostics, describe_table, pearson_correlation,
        regression_metrics,
    };
    use crate::table::SpectralTable;

    #[test]
    fn deciles_of_a_uniform_ramp_are_the_levels_scaled() {
        let table = SpectralTable::new(vec![(
            "energy",
            (0..=10).map(f64::from).collect::<Vec<f64>>(),
        )])
        .expect("table should build");

        let summary = describe_table(&table);
        assert_eq!(summary.len(), 1);

        let column = &summary[0];
        assert_eq!(column.column, "energy");
        assert_eq!(column.count, 11);
        assert_eq!(column.min, 0.0);
        assert_eq!(column.max, 10.0);
        assert!((column.mean - 5.0).abs() < 1.0e-12);
        for (level, decile) in DECILE_LEVELS.iter().zip(&column.deciles) {
            assert!(
                (decile - level * 10.0).abs() < 1.0e-12,
                "decile at {level} was {decile}"
            );
        }
    }

    #[test]
    fn single_row_column_has_undefined_spread() {
        let table =
            SpectralTable::new(vec![("energy", vec![4.2])]).expect("table should build");
        let summary = describe_table(&table);
        assert!(summary[0].std_dev.is_nan());
        assert_eq!(summary[0].deciles[4], 4.2);
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_plus_minus_one() {
        let table = SpectralTable::new(vec![
            ("up", vec![0.0, 1.0, 2.0, 3.0]),
            ("down", vec![3.0, 2.0, 1.0, 0.0]),
        ])
        .expect("table should build");

        let correlation = pearson_correlation(&table);
        assert_eq!(correlation.index, ["up", "down"]);
        assert_eq!(correlation.columns, ["up", "down"]);
        assert!((correlation.data[0][0] - 1.0).abs() < 1.0e-12);
        assert!((correlation.data[0][1] + 1.0).abs() < 1.0e-12);
        assert!((correlation.data[1][0] + 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn zero_variance_column_correlates_as_nan() {
        let table = SpectralTable::new(vec![
            ("flat", vec![2.0, 2.0, 2.0]),
            ("ramp", vec![0.0, 1.0, 2.0]),
        ])
        .expect("table should build");

        let correlation = pearson_correlation(&table);
        assert!(correlation.data[0][0].is_nan());
        assert!(correlation.data[0][1].is_nan());
        assert!((correlation.data[1][1] - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn exact_prediction_scores_perfectly() {
        let observed = [1.0, 2.0, 3.0, 4.0];
        let metrics = regression_metrics(&observed, &observed);
        assert!((metrics.r_squared - 1.0).abs() < 1.0e-12);
        assert!((metrics.explained_variance - 1.0).abs() < 1.0e-12);
        assert_eq!(metrics.max_error, 0.0);
        assert_eq!(metrics.mean_absolute_error, 0.0);
        assert_eq!(metrics.mean_squared_error, 0.0);
        assert_eq!(metrics.root_mean_squared_error, 0.0);
        assert_eq!(metrics.median_absolute_error, 0.0);
    }

    #[test]
    fn constant_offset_prediction_has_full_explained_variance() {
        let observed = [1.0, 2.0, 3.0, 4.0];
        let predicted = [2.0, 3.0, 4.0, 5.0];
        let metrics = regression_metrics(&observed, &predicted);

        // A pure offset leaves no residual variance but costs R².
        assert!((metrics.explained_variance - 1.0).abs() < 1.0e-12);
        assert!(metrics.r_squared < 1.0);
        assert_eq!(metrics.max_error, 1.0);
        assert_eq!(metrics.mean_absolute_error, 1.0);
        assert_eq!(metrics.median_absolute_error, 1.0);
    }

    #[test]
    fn metric_names_and_values_stay_aligned() {
        let metrics = regression_metrics(&[1.0, 2.0], &[1.0, 2.0]);
        assert_eq!(
            RegressionDiagnostics::METRIC_NAMES.len(),
            metrics.values().len()
        );
    }
}
