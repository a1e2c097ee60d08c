pub mod error;
pub mod financing;
pub mod returns;
pub mod time_value;
pub mod types;
pub mod validation;
pub mod valuation;

#[cfg(feature = "deal")]
pub mod deal;

pub use error::{CalculationFailure, DealAnalysisError, ErrorKind};
pub use types::*;

/// Standard result type for all deal-analysis operations
pub type DealAnalysisResult<T> = Result<T, DealAnalysisError>;
