//! Transform errors and non-fatal diagnostics.

use std::fmt;

use thiserror::Error;

/// Fatal transform failures. All of these abort before any output is
/// produced, so callers never see a partial script.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A scalar the generated rule cannot exist without is absent.
    #[error("toolchain is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A `requires` or `implies` edge names a feature that is neither
    /// declared nor injected.
    #[error("{referrer} references undeclared feature '{name}'")]
    UndeclaredFeature { referrer: String, name: String },

    /// The assembled output failed its self-consistency check. Indicates a
    /// defect in the emitters, not in the input.
    #[error("generated script failed consistency check: {detail}")]
    UnbalancedOutput { detail: String },
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// A non-fatal diagnostic. The run completes and the questionable input is
/// reproduced as authored; warnings are collected in emission order and
/// reported beside the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Warning {
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {}", self.message)
    }
}
