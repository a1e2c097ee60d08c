use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::DealAnalysisError;
use crate::types::{round2, Money, Percent, Rate};
use crate::validation;
use crate::DealAnalysisResult;

/// Net Present Value of a series of cash flows at a decimal rate (0.10 = 10%).
/// Index 0 is undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DealAnalysisResult<Money> {
    if rate <= dec!(-1) {
        return Err(DealAnalysisError::invalid_input(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                DealAnalysisError::non_finite(format!("NPV discount factor at period {t}"))
            })?;
        }
        let pv = cf
            .checked_div(discount)
            .ok_or_else(|| DealAnalysisError::non_finite(format!("NPV term at period {t}")))?;
        result = result
            .checked_add(pv)
            .ok_or_else(|| DealAnalysisError::non_finite("NPV sum"))?;
    }

    Ok(result)
}

/// NPV at a percentage discount rate, `sum cf_t / (1 + rate)^t`, rounded to 2 dp.
pub fn calculate_npv(discount_rate: Percent, cash_flows: &[Money]) -> DealAnalysisResult<Money> {
    validation::is_valid_rate(discount_rate, "discount_rate")?;
    validation::is_valid_array(cash_flows, "cash_flows")?;
    npv(discount_rate / dec!(100), cash_flows).map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(npv(dec!(-1), &[dec!(1)]).is_err());
    }

    #[test]
    fn test_calculate_npv_percent() {
        // -100 + 60/1.1 + 60/1.21 = 4.13
        let result = calculate_npv(dec!(10), &[dec!(-100), dec!(60), dec!(60)]).unwrap();
        assert_eq!(result, dec!(4.13));
    }

    #[test]
    fn test_calculate_npv_validates() {
        assert!(calculate_npv(dec!(150), &[dec!(-100), dec!(60)]).is_err());
        assert!(calculate_npv(dec!(10), &[]).is_err());
    }
}
