use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DealAnalysisError;
use crate::types::{round2, Money, Years};
use crate::validation;
use crate::DealAnalysisResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaybackPeriodResult {
    pub years: Years,
    pub is_achieved: bool,
    /// Shortfall at the end of the series; present only when payback is not achieved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<Money>,
}

/// Periods until the cumulative cash flow first turns non-negative.
///
/// The crossing period is interpolated linearly: if the balance is `-B` before
/// period `i` and `cash_flows[i]` brings it to or above zero, payback is
/// `(i - 1) + B / cash_flows[i]` years, rounded to 2 dp.
pub fn calculate_payback_period(
    cash_flows: &[Money],
) -> DealAnalysisResult<PaybackPeriodResult> {
    validation::is_valid_array(cash_flows, "cash_flows")?;

    let mut balance = cash_flows[0];
    if balance >= Decimal::ZERO {
        return Ok(PaybackPeriodResult {
            years: Decimal::ZERO,
            is_achieved: true,
            remaining_balance: None,
        });
    }

    for (i, cf) in cash_flows.iter().enumerate().skip(1) {
        let before = balance;
        balance = balance
            .checked_add(*cf)
            .ok_or_else(|| DealAnalysisError::non_finite("cumulative cash flow"))?;

        if balance >= Decimal::ZERO {
            // before < 0 and before + cf >= 0, so cf > 0
            let fraction = before.abs() / *cf;
            return Ok(PaybackPeriodResult {
                years: round2(Decimal::from((i - 1) as u64) + fraction),
                is_achieved: true,
                remaining_balance: None,
            });
        }
    }

    Ok(PaybackPeriodResult {
        years: Decimal::from((cash_flows.len() - 1) as u64),
        is_achieved: false,
        remaining_balance: Some(balance.abs()),
    })
}
