//! Numeric helpers for the preprocessing filters: validated linear
//! interpolation, even-grid resampling, and boxcar smoothing.

pub const OVERSAMPLING_FACTOR: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NumericsError {
    #[error("axis helpers require at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("axis/value length mismatch: axis={axis}, values={values}")]
    LengthMismatch { axis: usize, values: usize },
    #[error("axis entry must be finite at index {index}, got {value}")]
    NonFiniteAxis { index: usize, value: f64 },
    #[error("axis must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingAxis {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("interpolation query must be finite, got {value}")]
    NonFiniteQuery { value: f64 },
    #[error("smoothing window must be a positive integer, got {window}")]
    InvalidWindow { window: usize },
    #[error("resampling factor must be a positive integer, got {factor}")]
    InvalidFactor { factor: usize },
}

/// Linear interpolation with boundary clamping: queries outside the axis
/// return the first/last value.
pub fn interpolate_linear(axis: &[f64], values: &[f64], query: f64) -> Result<f64, NumericsError> {
    validate_axis_and_values(axis, values)?;
    if !query.is_finite() {
        return Err(NumericsError::NonFiniteQuery { value: query });
    }

    let last = axis.len() - 1;
    if query <= axis[0] {
        return Ok(values[0]);
    }
    if query >= axis[last] {
        return Ok(values[last]);
    }

    match axis.binary_search_by(|probe| probe.total_cmp(&query)) {
        Ok(index) => Ok(values[index]),
        Err(upper) => {
            let lower = upper - 1;
            let x0 = axis[lower];
            let x1 = axis[upper];
            let fraction = (query - x0) / (x1 - x0);
            Ok(values[lower] + (values[upper] - values[lower]) * fraction)
        }
    }
}

/// Evenly spaced grid spanning `[axis[0], axis[last]]` with
/// `factor * axis.len()` points.
pub fn resample_even_grid(axis: &[f64], factor: usize) -> Result<Vec<f64>, NumericsError> {
    validate_axis(axis)?;
    if factor == 0 {
        return Err(NumericsError::InvalidFactor { factor });
    }

    let points = axis.len() * factor;
    let start = axis[0];
    let stop = axis[axis.len() - 1];
    let step = (stop - start) / (points - 1) as f64;

    let mut grid = Vec::with_capacity(points);
    for index in 0..points {
        grid.push(start + step * index as f64);
    }
    // Pin the endpoint exactly so clamping at the boundary is bit-stable.
    grid[points - 1] = stop;
    Ok(grid)
}

/// Normalized boxcar moving average, same-length output.
///
/// Matches `mode="same"` convolution semantics: the kernel is centered on
/// each sample and out-of-range neighbours contribute zero, so edges taper.
pub fn boxcar_smooth(values: &[f64], window: usize) -> Result<Vec<f64>, NumericsError> {
    if window == 0 {
        return Err(NumericsError::InvalidWindow { window });
    }

    let weight = 1.0 / window as f64;
    let half = (window - 1) / 2;
    let mut output = Vec::with_capacity(values.len());
    for center in 0..values.len() {
        let mut sum = 0.0;
        for offset in 0..window {
            let position = center + half;
            if position >= offset {
                let source = position - offset;
                if source < values.len() {
                    sum += values[source];
                }
            }
        }
        output.push(sum * weight);
    }
    Ok(output)
}

fn validate_axis(axis: &[f64]) -> Result<(), NumericsError> {
    if axis.len() < 2 {
        return Err(NumericsError::InsufficientPoints { actual: axis.len() });
    }
    for (index, value) in axis.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(NumericsError::NonFiniteAxis { index, value });
        }
        if index > 0 {
            let previous = axis[index - 1];
            if value <= previous {
                return Err(NumericsError::NonIncreasingAxis {
                    index,
                    previous,
                    current: value,
                });
            }
        }
    }
    Ok(())
}

fn validate_axis_and_values(axis: &[f64], values: &[f64]) -> Result<(), NumericsError> {
    validate_axis(axis)?;
    if axis.len() != values.len() {
        return Err(NumericsError::LengthMismatch {
            axis: axis.len(),
            values: values.len(),
        });
    }
    Ok(())
}
