//! Structured fit report: the pure transform from a solver outcome into the
//! serializable report dictionary.

use crate::domain::{OrderedMap, SpecFitError, StageResult};
use crate::fitting::{FitOutcome, FitParameter};
use serde::Serialize;

pub const DEFAULT_MIN_CORRELATION: f64 = 0.1;

const CLOSE_ABS_TOLERANCE: f64 = 1.0e-8;
const CLOSE_REL_TOLERANCE: f64 = 1.0e-5;

/// Parameter iteration order for the report.
#[derive(Debug, Clone, Copy)]
pub enum SortPolicy {
    /// Solver insertion order (the default).
    Insertion,
    /// Lexicographic by parameter name.
    Alphanumeric,
    /// Custom key function.
    ByKey(fn(&FitParameter) -> String),
}

/// Inputs of [`fit_report_as_dict`].
#[derive(Clone, Copy)]
pub struct ReportInput<'a> {
    pub outcome: &'a FitOutcome,
    /// Reference parameter set; same-name values land in `model_value`.
    pub reference: Option<&'a [FitParameter]>,
    pub include_correlations: bool,
    /// Minimum correlation magnitude; comparison is strict `>` on the raw
    /// floating value.
    pub min_correlation: f64,
    pub sort: SortPolicy,
}

impl<'a> ReportInput<'a> {
    pub fn new(outcome: &'a FitOutcome) -> Self {
        Self {
            outcome,
            reference: None,
            include_correlations: true,
            min_correlation: DEFAULT_MIN_CORRELATION,
            sort: SortPolicy::Insertion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfigurations {
    pub fitting_method: String,
    pub function_evals: usize,
    pub data_points: usize,
    pub variable_count: usize,
    pub degrees_of_freedom: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub akaike_criterion: f64,
    pub bayesian_criterion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_value: Option<f64>,
    pub best_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_relative: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_absolute: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorbarFlags {
    pub at_initial_value: bool,
    pub at_boundary: bool,
}

/// The report dictionary. Top-level keys are fixed; `configurations` and
/// `statistics` stay empty for a bare parameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub configurations: Option<ReportConfigurations>,
    pub statistics: Option<ReportStatistics>,
    pub variables: OrderedMap<VariableReport>,
    pub errorbars: OrderedMap<ErrorbarFlags>,
    pub correlations: OrderedMap<f64>,
}

/// Build the report dictionary from a solver outcome.
///
/// Deterministic for a fixed iteration order, no I/O. The only fatal path is
/// a solver that could not estimate error bars and offers no covariance
/// fallback to fill them in.
pub fn fit_report_as_dict(input: ReportInput<'_>) -> StageResult<FitReport> {
    let ordered = ordered_parameters(input.outcome, input.sort);

    let mut report = FitReport {
        configurations: None,
        statistics: None,
        variables: OrderedMap::new(),
        errorbars: OrderedMap::new(),
        correlations: OrderedMap::new(),
    };

    if let Some(statistics) = &input.outcome.statistics {
        report.configurations = Some(ReportConfigurations {
            fitting_method: statistics.method.clone(),
            function_evals: statistics.function_evals,
            data_points: statistics.data_points,
            variable_count: statistics.variable_count,
            degrees_of_freedom: statistics.degrees_of_freedom,
        });
        report.statistics = Some(ReportStatistics {
            chi_square: statistics.chi_square,
            reduced_chi_square: statistics.reduced_chi_square,
            akaike_criterion: statistics.akaike_criterion,
            bayesian_criterion: statistics.bayesian_criterion,
        });

        if !statistics.errorbars_estimated {
            for parameter in ordered.iter().filter(|parameter| parameter.vary) {
                report
                    .errorbars
                    .insert(parameter.name.clone(), errorbar_flags(parameter));
            }
            if !statistics.covariance_fallback {
                return Err(SpecFitError::computation(
                    "FIT.UNCERTAINTY_FALLBACK",
                    format!(
                        "method '{}' cannot estimate uncertainties; enable the numerical \
                         covariance fallback to obtain error bars",
                        statistics.method
                    ),
                ));
            }
        }
    }

    for parameter in &ordered {
        report
            .variables
            .insert(parameter.name.clone(), variable_report(parameter, &input));
    }

    if input.include_correlations {
        collect_correlations(&ordered, input.min_correlation, &mut report.correlations);
    }

    Ok(report)
}

fn ordered_parameters<'a>(outcome: &'a FitOutcome, sort: SortPolicy) -> Vec<&'a FitParameter> {
    let mut ordered: Vec<&FitParameter> = outcome.parameters.iter().collect();
    match sort {
        SortPolicy::Insertion => {}
        SortPolicy::Alphanumeric => ordered.sort_by(|a, b| a.name.cmp(&b.name)),
        SortPolicy::ByKey(key) => ordered.sort_by_key(|parameter| key(parameter)),
    }
    ordered
}

fn variable_report(parameter: &FitParameter, input: &ReportInput<'_>) -> VariableReport {
    let model_value = input.reference.and_then(|reference| {
        reference
            .iter()
            .find(|candidate| candidate.name == parameter.name)
            .map(|candidate| candidate.value)
    });

    let error_absolute = parameter.stderr.map(|stderr| {
        if parameter.value == 0.0 {
            // Division-by-zero sentinel, not an error condition.
            f64::INFINITY
        } else {
            (stderr / parameter.value).abs()
        }
    });

    VariableReport {
        init_value: parameter.init_value,
        model_value,
        best_value: parameter.value,
        error_relative: parameter.stderr,
        error_absolute,
    }
}

fn errorbar_flags(parameter: &FitParameter) -> ErrorbarFlags {
    let at_initial_value = parameter
        .init_value
        .map(|init| values_close(parameter.value, init))
        .unwrap_or(false);
    let at_boundary = [parameter.min, parameter.max]
        .iter()
        .flatten()
        .any(|bound| values_close(parameter.value, *bound));
    ErrorbarFlags {
        at_initial_value,
        at_boundary,
    }
}

fn values_close(left: f64, right: f64) -> bool {
    (left - right).abs() <= CLOSE_ABS_TOLERANCE + CLOSE_REL_TOLERANCE * right.abs()
}

fn collect_correlations(
    ordered: &[&FitParameter],
    min_correlation: f64,
    entries: &mut OrderedMap<f64>,
) {
    for (position, parameter) in ordered.iter().enumerate() {
        if !parameter.vary {
            continue;
        }
        for partner in ordered.iter().skip(position + 1) {
            if !partner.vary {
                continue;
            }
            // The source map may be one-sided; either direction identifies
            // the same unordered pair, emitted once under the earlier name.
            let coefficient = parameter
                .correlations
                .get(&partner.name)
                .or_else(|| partner.correlations.get(&parameter.name));
            if let Some(coefficient) = coefficient {
                if coefficient.abs() > min_correlation {
                    entries.insert(
                        format!("{}, {}", parameter.name, partner.name),
                        *coefficient,
                    );
                }
            }
        }
    }
}
