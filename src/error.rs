//! Error types for loan amortization and IRR solving

use thiserror::Error;

/// Result alias used throughout the crate
pub type LoanResult<T> = Result<T, LoanError>;

/// Everything that can go wrong between reading the inputs and solving the IRR
#[derive(Error, Debug)]
pub enum LoanError {
    /// Loan terms failed validation at construction time
    #[error("Invalid loan terms: {reason}")]
    InvalidTerms { reason: String },

    /// A charge-off or prepayment rate fell outside [0, 1]
    #[error("Invalid {kind} rate {rate} at period {period}")]
    InvalidRate {
        kind: &'static str,
        period: u32,
        rate: f64,
    },

    /// Cash flows with no meaningful IRR
    #[error("Degenerate cash flows: {reason}")]
    DegenerateCashFlow { reason: String },

    /// The IRR solver used up its iteration budget
    #[error("IRR did not converge after {iterations} iterations (residual: {residual})")]
    NoConvergence { iterations: u32, residual: f64 },

    /// A requested rate curve is not a column of the sheet
    #[error("Curve '{key}' not found in sheet '{sheet}'")]
    CurveNotFound { sheet: String, key: String },

    /// Malformed input data (sheet or loan tape)
    #[error("Invalid input in {source_name}: {reason}")]
    Input { source_name: String, reason: String },

    /// Malformed configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl LoanError {
    pub(crate) fn invalid_terms(reason: impl Into<String>) -> Self {
        LoanError::InvalidTerms {
            reason: reason.into(),
        }
    }

    pub(crate) fn input(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoanError::Input {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
