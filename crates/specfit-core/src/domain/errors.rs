use std::fmt::{Display, Formatter};

/// Error category, mapped to a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecFitErrorCategory {
    InputValidation,
    IoSystem,
    ComputationError,
    InternalError,
}

impl SpecFitErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "input validation",
            Self::IoSystem => "io system",
            Self::ComputationError => "computation",
            Self::InternalError => "internal",
        }
    }
}

/// Pipeline error carrying a category and a stable diagnostic placeholder.
///
/// The placeholder (`INPUT.COLUMN_SELECTION`, `IO.SUMMARY_WRITE`, ...) names the
/// failing operation so diagnostics stay greppable across releases; the message
/// names the offending key, column, or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFitError {
    category: SpecFitErrorCategory,
    placeholder: String,
    message: String,
}

impl SpecFitError {
    pub fn input_validation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_category(SpecFitErrorCategory::InputValidation, placeholder, message)
    }

    pub fn io_system(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_category(SpecFitErrorCategory::IoSystem, placeholder, message)
    }

    pub fn computation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_category(SpecFitErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_category(SpecFitErrorCategory::InternalError, placeholder, message)
    }

    fn with_category(
        category: SpecFitErrorCategory,
        placeholder: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder: placeholder.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> SpecFitErrorCategory {
        self.category
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    /// Diagnostic line printed to standard error on fatal paths.
    pub fn diagnostic_line(&self) -> String {
        format!("Error: [{}] {}", self.placeholder, self.message)
    }

    /// Trailing summary line for fatal exits; internal errors get none because
    /// they indicate a defect rather than an operator-correctable condition.
    pub fn fatal_exit_line(&self) -> Option<String> {
        match self.category {
            SpecFitErrorCategory::InternalError => None,
            _ => Some(format!(
                "specfit-rs aborted: {} failure (exit code {})",
                self.category.as_str(),
                self.exit_code()
            )),
        }
    }
}

impl Display for SpecFitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.placeholder, self.message)
    }
}

impl std::error::Error for SpecFitError {}

pub type StageResult<T> = Result<T, SpecFitError>;
