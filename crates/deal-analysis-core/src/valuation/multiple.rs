use crate::error::DealAnalysisError;
use crate::types::{round2, Money, Multiple};
use crate::validation;
use crate::DealAnalysisResult;

/// Enterprise value by the EBITDA multiple convention: `EV = EBITDA x multiple`,
/// rounded to 2 dp.
pub fn calculate_valuation(ebitda: Money, multiple: Multiple) -> DealAnalysisResult<Money> {
    validation::is_positive(ebitda, "ebitda")?;
    validation::is_positive(multiple, "multiple")?;

    let enterprise_value = ebitda
        .checked_mul(multiple)
        .ok_or_else(|| DealAnalysisError::non_finite("enterprise value"))?;

    Ok(round2(enterprise_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_basic_valuation() {
        assert_eq!(calculate_valuation(dec!(1000), dec!(5)).unwrap(), dec!(5000));
    }

    #[test]
    fn test_rounds_to_cents() {
        // 123.456 * 7.5 = 925.92
        assert_eq!(
            calculate_valuation(dec!(123.456), dec!(7.5)).unwrap(),
            dec!(925.92)
        );
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let err = calculate_valuation(dec!(-5), dec!(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(calculate_valuation(dec!(100), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_overflow_is_calculation_failure() {
        let err = calculate_valuation(Decimal::MAX, dec!(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalculationFailure);
    }
}
