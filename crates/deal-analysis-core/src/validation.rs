//! Input guards run at the top of every public calculation.
//!
//! `Decimal` cannot hold NaN or Infinity, so inside the engine "finite" is
//! guaranteed by the type. Host floats coming from bindings or other callers
//! go through [`finite_decimal`] / [`finite_decimals`] first.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::DealAnalysisError;
use crate::types::Percent;
use crate::DealAnalysisResult;

/// Require `value > 0`.
pub fn is_positive(value: Decimal, field: &str) -> DealAnalysisResult<()> {
    if value <= Decimal::ZERO {
        return Err(DealAnalysisError::invalid_input(field, "must be positive"));
    }
    Ok(())
}

/// Require a percentage in `[0, 100]`.
pub fn is_valid_rate(value: Percent, field: &str) -> DealAnalysisResult<()> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(DealAnalysisError::invalid_input(
            field,
            "must be between 0 and 100",
        ));
    }
    Ok(())
}

/// Require a non-empty series.
pub fn is_valid_array(values: &[Decimal], field: &str) -> DealAnalysisResult<()> {
    if values.is_empty() {
        return Err(DealAnalysisError::invalid_input(field, "cannot be empty"));
    }
    Ok(())
}

/// Convert a host float, rejecting NaN, infinities and values outside the decimal range.
pub fn finite_decimal(value: f64, field: &str) -> DealAnalysisResult<Decimal> {
    if !value.is_finite() {
        return Err(DealAnalysisError::invalid_input(
            field,
            "must be a finite number",
        ));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        DealAnalysisError::invalid_input(field, "is outside the supported numeric range")
    })
}

/// Convert a host float series element by element; errors name the offending index.
pub fn finite_decimals(values: &[f64], field: &str) -> DealAnalysisResult<Vec<Decimal>> {
    if values.is_empty() {
        return Err(DealAnalysisError::invalid_input(field, "cannot be empty"));
    }
    values
        .iter()
        .enumerate()
        .map(|(i, v)| finite_decimal(*v, &format!("{field}[{i}]")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_is_positive() {
        assert!(is_positive(dec!(0.01), "x").is_ok());
        assert!(is_positive(Decimal::ZERO, "x").is_err());
        assert!(is_positive(dec!(-5), "x").is_err());
    }

    #[test]
    fn test_is_valid_rate_bounds() {
        assert!(is_valid_rate(Decimal::ZERO, "rate").is_ok());
        assert!(is_valid_rate(dec!(100), "rate").is_ok());
        assert!(is_valid_rate(dec!(100.01), "rate").is_err());
        assert!(is_valid_rate(dec!(-0.01), "rate").is_err());
    }

    #[test]
    fn test_empty_array_rejected() {
        let err = is_valid_array(&[], "cash_flows").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("cash_flows"));
    }

    #[test]
    fn test_finite_decimal_rejects_nan_and_infinity() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = finite_decimal(bad, "ebitda").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(finite_decimal(2.5, "ebitda").unwrap(), dec!(2.5));
    }

    #[test]
    fn test_finite_decimal_out_of_range() {
        assert!(finite_decimal(1e300, "principal").is_err());
    }

    #[test]
    fn test_finite_decimals_names_index() {
        let err = finite_decimals(&[-100.0, f64::NAN, 60.0], "cash_flows").unwrap_err();
        match err {
            DealAnalysisError::InvalidInput { field, .. } => assert_eq!(field, "cash_flows[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
