//! Per-component model evaluation.
//!
//! Parameters follow the `<model>_<attribute>_<suffix>` naming convention
//! (`gaussian_amplitude_1`, `linear_slope_1`, ...). The evaluator groups
//! parameters by model and suffix and produces one intensity column per
//! component instance, named `<model>_<suffix>`.

use crate::domain::{SpecFitError, StageResult};
use crate::fitting::{FitParameter, ObjectiveModel};
use std::f64::consts::PI;

const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949_3;

/// Collaborator computing per-component contributions; the postprocessing
/// stage appends the returned columns and never touches existing ones.
pub trait ComponentEvaluator {
    fn component_contributions(
        &self,
        parameters: &[FitParameter],
        axis: &[f64],
    ) -> StageResult<Vec<(String, Vec<f64>)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentModel {
    Gaussian,
    Lorentzian,
    PseudoVoigt,
    Exponential,
    Linear,
    Constant,
}

impl ComponentModel {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gaussian" => Some(Self::Gaussian),
            "lorentzian" => Some(Self::Lorentzian),
            "pseudovoigt" => Some(Self::PseudoVoigt),
            "exponential" => Some(Self::Exponential),
            "linear" => Some(Self::Linear),
            "constant" => Some(Self::Constant),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Lorentzian => "lorentzian",
            Self::PseudoVoigt => "pseudovoigt",
            Self::Exponential => "exponential",
            Self::Linear => "linear",
            Self::Constant => "constant",
        }
    }

    const fn attributes(self) -> &'static [&'static str] {
        match self {
            Self::Gaussian | Self::Lorentzian => &["amplitude", "center", "fwhm"],
            Self::PseudoVoigt => &["amplitude", "center", "fwhm", "fraction"],
            Self::Exponential => &["amplitude", "decay", "intercept"],
            Self::Linear => &["slope", "intercept"],
            Self::Constant => &["amplitude"],
        }
    }
}

#[derive(Debug, Clone)]
struct ComponentInstance {
    model: ComponentModel,
    suffix: String,
    attributes: Vec<(String, f64)>,
}

impl ComponentInstance {
    fn column_name(&self) -> String {
        format!("{}_{}", self.model.as_str(), self.suffix)
    }

    fn attribute(&self, name: &str) -> StageResult<f64> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                SpecFitError::input_validation(
                    "INPUT.COMPONENT_ATTRIBUTE",
                    format!(
                        "component '{}' is missing attribute '{}'",
                        self.column_name(),
                        name
                    ),
                )
            })
    }

    fn evaluate(&self, axis: &[f64]) -> StageResult<Vec<f64>> {
        let values = match self.model {
            ComponentModel::Gaussian => {
                let amplitude = self.attribute("amplitude")?;
                let center = self.attribute("center")?;
                let fwhm = self.attribute("fwhm")?;
                axis.iter()
                    .map(|x| gaussian(*x, amplitude, center, fwhm))
                    .collect()
            }
            ComponentModel::Lorentzian => {
                let amplitude = self.attribute("amplitude")?;
                let center = self.attribute("center")?;
                let fwhm = self.attribute("fwhm")?;
                axis.iter()
                    .map(|x| lorentzian(*x, amplitude, center, fwhm))
                    .collect()
            }
            ComponentModel::PseudoVoigt => {
                let amplitude = self.attribute("amplitude")?;
                let center = self.attribute("center")?;
                let fwhm = self.attribute("fwhm")?;
                let fraction = self.attribute("fraction")?;
                axis.iter()
                    .map(|x| {
                        fraction * lorentzian(*x, amplitude, center, fwhm)
                            + (1.0 - fraction) * gaussian(*x, amplitude, center, fwhm)
                    })
                    .collect()
            }
            ComponentModel::Exponential => {
                let amplitude = self.attribute("amplitude")?;
                let decay = self.attribute("decay")?;
                let intercept = self.attribute("intercept")?;
                axis.iter()
                    .map(|x| amplitude * (-x / decay).exp() + intercept)
                    .collect()
            }
            ComponentModel::Linear => {
                let slope = self.attribute("slope")?;
                let intercept = self.attribute("intercept")?;
                axis.iter().map(|x| slope * x + intercept).collect()
            }
            ComponentModel::Constant => {
                let amplitude = self.attribute("amplitude")?;
                vec![amplitude; axis.len()]
            }
        };
        Ok(values)
    }
}

fn gaussian(x: f64, amplitude: f64, center: f64, fwhm: f64) -> f64 {
    let sigma = fwhm / FWHM_TO_SIGMA;
    let argument = (x - center) / sigma;
    amplitude / (sigma * (2.0 * PI).sqrt()) * (-0.5 * argument * argument).exp()
}

fn lorentzian(x: f64, amplitude: f64, center: f64, fwhm: f64) -> f64 {
    let gamma = fwhm / 2.0;
    amplitude / PI * gamma / ((x - center) * (x - center) + gamma * gamma)
}

/// Built-in evaluator for the conventional parameter naming scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinComponents;

impl BuiltinComponents {
    fn group_components(parameters: &[FitParameter]) -> StageResult<Vec<ComponentInstance>> {
        let mut components: Vec<ComponentInstance> = Vec::new();

        for parameter in parameters {
            let mut tokens = parameter.name.splitn(3, '_');
            let keyword = tokens.next().unwrap_or_default();
            let attribute = tokens.next().unwrap_or_default();
            let suffix = tokens.next().unwrap_or_default();

            if attribute.is_empty() || suffix.is_empty() {
                return Err(SpecFitError::input_validation(
                    "INPUT.COMPONENT_NAME",
                    format!(
                        "parameter '{}' does not follow the '<model>_<attribute>_<suffix>' naming scheme",
                        parameter.name
                    ),
                ));
            }

            let model = ComponentModel::from_keyword(keyword).ok_or_else(|| {
                SpecFitError::input_validation(
                    "INPUT.COMPONENT_MODEL",
                    format!(
                        "parameter '{}' names unknown component model '{}'",
                        parameter.name, keyword
                    ),
                )
            })?;

            if !model.attributes().contains(&attribute) {
                return Err(SpecFitError::input_validation(
                    "INPUT.COMPONENT_ATTRIBUTE",
                    format!(
                        "component model '{}' has no attribute '{}' (parameter '{}')",
                        keyword, attribute, parameter.name
                    ),
                ));
            }

            let slot = components
                .iter_mut()
                .find(|instance| instance.model == model && instance.suffix == suffix);
            match slot {
                Some(instance) => instance
                    .attributes
                    .push((attribute.to_string(), parameter.value)),
                None => components.push(ComponentInstance {
                    model,
                    suffix: suffix.to_string(),
                    attributes: vec![(attribute.to_string(), parameter.value)],
                }),
            }
        }

        Ok(components)
    }
}

impl ComponentEvaluator for BuiltinComponents {
    fn component_contributions(
        &self,
        parameters: &[FitParameter],
        axis: &[f64],
    ) -> StageResult<Vec<(String, Vec<f64>)>> {
        let components = Self::group_components(parameters)?;
        let mut columns = Vec::with_capacity(components.len());
        for component in &components {
            columns.push((component.column_name(), component.evaluate(axis)?));
        }
        Ok(columns)
    }
}

impl ObjectiveModel for BuiltinComponents {
    /// The composite model is the sum of all component contributions.
    fn evaluate(&self, parameters: &[FitParameter], axis: &[f64]) -> StageResult<Vec<f64>> {
        let contributions = self.component_contributions(parameters, axis)?;
        let mut total = vec![0.0; axis.len()];
        for (_, values) in &contributions {
            for (slot, value) in total.iter_mut().zip(values) {
                *slot += value;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::{BuiltinComponents, ComponentEvaluator, FWHM_TO_SIGMA};
    use crate::fitting::{FitParameter, ObjectiveModel};
    use std::f64::consts::PI;

    fn parameters(names_and_values: &[(&str, f64)]) -> Vec<FitParameter> {
        names_and_values
            .iter()
            .map(|(name, value)| FitParameter::new(*name, *value))
            .collect()
    }

    #[test]
    fn gaussian_peak_height_matches_closed_form() {
        let params = parameters(&[
            ("gaussian_amplitude_1", 2.0),
            ("gaussian_center_1", 1.0),
            ("gaussian_fwhm_1", 0.5),
        ]);
        let columns = BuiltinComponents
            .component_contributions(&params, &[1.0])
            .expect("evaluation should succeed");

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].0, "gaussian_1");

        let sigma = 0.5 / FWHM_TO_SIGMA;
        let expected = 2.0 / (sigma * (2.0 * PI).sqrt());
        assert!((columns[0].1[0] - expected).abs() < 1.0e-12);
    }

    #[test]
    fn components_are_grouped_by_suffix() {
        let params = parameters(&[
            ("gaussian_amplitude_1", 1.0),
            ("gaussian_center_1", 0.0),
            ("gaussian_fwhm_1", 1.0),
            ("lorentzian_amplitude_2", 1.0),
            ("lorentzian_center_2", 2.0),
            ("lorentzian_fwhm_2", 1.0),
            ("constant_amplitude_3", 0.25),
        ]);
        let columns = BuiltinComponents
            .component_contributions(&params, &[0.0, 1.0, 2.0])
            .expect("evaluation should succeed");

        let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["gaussian_1", "lorentzian_2", "constant_3"]);
        assert_eq!(columns[2].1, [0.25, 0.25, 0.25]);
    }

    #[test]
    fn composite_model_is_the_sum_of_components() {
        let params = parameters(&[
            ("linear_slope_1", 2.0),
            ("linear_intercept_1", 1.0),
            ("constant_amplitude_2", 0.5),
        ]);
        let total = BuiltinComponents
            .evaluate(&params, &[0.0, 1.0, 2.0])
            .expect("evaluation should succeed");
        assert_eq!(total, [1.5, 3.5, 5.5]);
    }

    #[test]
    fn unknown_model_keyword_is_rejected() {
        let params = parameters(&[("sigmoid_amplitude_1", 1.0)]);
        let error = BuiltinComponents
            .component_contributions(&params, &[0.0])
            .expect_err("unknown model should fail");
        assert_eq!(error.placeholder(), "INPUT.COMPONENT_MODEL");
        assert!(error.message().contains("sigmoid"));
    }

    #[test]
    fn missing_attribute_is_rejected() {
        let params = parameters(&[
            ("gaussian_amplitude_1", 1.0),
            ("gaussian_center_1", 0.0),
        ]);
        let error = BuiltinComponents
            .component_contributions(&params, &[0.0])
            .expect_err("missing fwhm should fail");
        assert_eq!(error.placeholder(), "INPUT.COMPONENT_ATTRIBUTE");
        assert!(error.message().contains("fwhm"));
    }

    #[test]
    fn malformed_parameter_name_is_rejected() {
        let params = parameters(&[("amplitude", 1.0)]);
        let error = BuiltinComponents
            .component_contributions(&params, &[0.0])
            .expect_err("short name should fail");
        assert_eq!(error.placeholder(), "INPUT.COMPONENT_NAME");
    }

    #[test]
    fn global_suffixes_keep_spectrum_labels() {
        let params = parameters(&[
            ("gaussian_amplitude_1_1", 1.0),
            ("gaussian_center_1_1", 0.0),
            ("gaussian_fwhm_1_1", 1.0),
            ("gaussian_amplitude_1_2", 2.0),
            ("gaussian_center_1_2", 0.0),
            ("gaussian_fwhm_1_2", 1.0),
        ]);
        let columns = BuiltinComponents
            .component_contributions(&params, &[0.0])
            .expect("evaluation should succeed");
        let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["gaussian_1_1", "gaussian_1_2"]);
        assert!((columns[1].1[0] - 2.0 * columns[0].1[0]).abs() < 1.0e-12);
    }
}
