//! Fitting-run configuration.
//!
//! The CLI layer deserializes these from a JSON settings document; the core
//! assumes types and ranges were validated there. Every field has a default so
//! a settings document only states what it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one fitting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Ordered column selection; index 0 is the independent axis.
    pub columns: Vec<String>,
    /// Lower inclusive bound on the independent axis.
    pub energy_start: Option<f64>,
    /// Upper inclusive bound on the independent axis.
    pub energy_stop: Option<f64>,
    /// Offset added to every independent-axis value; 0 disables the shift.
    pub shift: f64,
    /// Resample to five times the original row count before fitting.
    pub oversampling: bool,
    /// Boxcar window size for intensity smoothing; 0 disables smoothing.
    pub smooth: usize,
    /// Number of spectra in a global fit; 0 selects single-spectrum mode.
    pub global_spectra: usize,
    /// Confidence-interval estimation request; absent skips the estimate.
    pub conf_interval: Option<ConfidenceSettings>,
    /// Base path for persisted artifacts; required by the persistence stage.
    pub outfile: Option<PathBuf>,
    pub solver: SolverOptions,
    pub report: ReportSettings,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            energy_start: None,
            energy_stop: None,
            shift: 0.0,
            oversampling: false,
            smooth: 0,
            global_spectra: 0,
            conf_interval: None,
            outfile: None,
            solver: SolverOptions::default(),
            report: ReportSettings::default(),
        }
    }
}

/// Options forwarded verbatim to the external minimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub method: String,
    pub max_evaluations: Option<usize>,
    pub nan_policy: NanPolicy,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: "leastsq".to_string(),
            max_evaluations: None,
            nan_policy: NanPolicy::Raise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NanPolicy {
    Raise,
    Propagate,
    Omit,
}

/// Confidence-interval estimation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceSettings {
    /// Sigma levels to bracket, in ascending order.
    pub sigmas: Vec<f64>,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            sigmas: vec![1.0, 2.0, 3.0],
        }
    }
}

/// Report-builder overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Minimum correlation magnitude for a pair to be reported.
    pub min_correlation: f64,
    /// Sort variables alphanumerically instead of by insertion order.
    pub alphanumeric_sort: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            min_correlation: 0.1,
            alphanumeric_sort: false,
        }
    }
}
