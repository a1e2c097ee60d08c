use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DealAnalysisError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Calculation failure: {0}")]
    CalculationFailure(#[from] CalculationFailure),
}

/// Numerically well-formed input that still produced a pathological result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationFailure {
    #[error("{context} did not produce a finite result")]
    NonFiniteResult { context: String },

    #[error("IRR diverged at iteration {iteration}: discount factor is not finite at rate {rate}")]
    IrrDivergence { iteration: u32, rate: Decimal },

    #[error("IRR did not converge after {iterations} iterations (last delta: {last_delta})")]
    IrrNonConvergent { iterations: u32, last_delta: Decimal },
}

/// Coarse classification used by callers that only care whether the request
/// itself was bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    CalculationFailure,
}

impl DealAnalysisError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DealAnalysisError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn non_finite(context: impl Into<String>) -> Self {
        CalculationFailure::NonFiniteResult {
            context: context.into(),
        }
        .into()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DealAnalysisError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DealAnalysisError::CalculationFailure(_) => ErrorKind::CalculationFailure,
        }
    }
}
