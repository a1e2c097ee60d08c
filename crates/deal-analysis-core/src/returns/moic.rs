use crate::error::DealAnalysisError;
use crate::types::{round2, Money, Multiple};
use crate::validation;
use crate::DealAnalysisResult;

/// Multiple on invested capital, `total_return / initial_investment`, rounded to 2 dp.
/// A negative total return is a valid loss.
pub fn calculate_moic(
    total_return: Money,
    initial_investment: Money,
) -> DealAnalysisResult<Multiple> {
    validation::is_positive(initial_investment, "initial_investment")?;

    total_return
        .checked_div(initial_investment)
        .map(round2)
        .ok_or_else(|| DealAnalysisError::non_finite("MOIC"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gain() {
        assert_eq!(calculate_moic(dec!(250), dec!(100)).unwrap(), dec!(2.50));
    }

    #[test]
    fn test_capital_loss() {
        assert_eq!(calculate_moic(dec!(50), dec!(100)).unwrap(), dec!(0.50));
        assert_eq!(calculate_moic(dec!(-30), dec!(100)).unwrap(), dec!(-0.30));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(calculate_moic(dec!(100), dec!(3)).unwrap(), dec!(33.33));
    }

    #[test]
    fn test_zero_investment_rejected() {
        let err = calculate_moic(dec!(100), Decimal::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_overflow() {
        let err = calculate_moic(Decimal::MAX, dec!(0.0001)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CalculationFailure);
    }
}
