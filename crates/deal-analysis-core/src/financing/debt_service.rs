use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealAnalysisError;
use crate::types::*;
use crate::validation;
use crate::DealAnalysisResult;

const MONTHS_PER_YEAR: u32 = 12;
/// Longest amortisation term accepted, in years
pub const MAX_TERM_YEARS: u32 = 100;

/// Level annual debt service on a fixed-rate, fully amortising loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtServiceResult {
    /// One identical payment per year of the term
    pub yearly_payments: Vec<Money>,
    pub total_interest: Money,
    pub total_payment: Money,
}

/// A single year of the amortisation breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

fn validate_loan(principal: Money, annual_rate: Percent, term_years: u32) -> DealAnalysisResult<()> {
    validation::is_positive(principal, "principal")?;
    validation::is_valid_rate(annual_rate, "interest_rate")?;
    validation::is_positive(Decimal::from(term_years), "term_years")?;
    if term_years > MAX_TERM_YEARS {
        return Err(DealAnalysisError::invalid_input(
            "term_years",
            format!("must be at most {MAX_TERM_YEARS}"),
        ));
    }
    Ok(())
}

fn monthly_rate(annual_rate: Percent) -> Rate {
    annual_rate / Decimal::from(MONTHS_PER_YEAR) / dec!(100)
}

/// `P * r / (1 - (1 + r)^-n)`, with the discount factor raised directly so a long
/// term underflows toward zero instead of overflowing.
fn level_payment(principal: Money, rate: Rate, months: u64) -> DealAnalysisResult<Money> {
    if rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let discount = (Decimal::ONE / (Decimal::ONE + rate))
        .checked_powu(months)
        .ok_or_else(|| DealAnalysisError::non_finite("loan discount factor"))?;
    let denominator = Decimal::ONE - discount;
    if denominator <= Decimal::ZERO {
        return Err(DealAnalysisError::non_finite("annuity denominator"));
    }

    principal
        .checked_mul(rate)
        .and_then(|n| n.checked_div(denominator))
        .ok_or_else(|| DealAnalysisError::non_finite("monthly payment"))
}

/// Unrounded monthly payment for a fixed-rate loan.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
) -> DealAnalysisResult<Money> {
    validate_loan(principal, annual_rate, term_years)?;
    let months = u64::from(term_years) * u64::from(MONTHS_PER_YEAR);
    level_payment(principal, monthly_rate(annual_rate), months)
}

/// Yearly debt service for a loan amortised monthly at a fixed percentage rate.
///
/// Every year carries the same payment (twelve monthly instalments). Totals are
/// computed from the unrounded payment, so `total_payment` can differ from the
/// sum of the rounded yearly payments by at most half a cent per year.
/// `total_interest` is always exactly `total_payment - principal`.
/// Terms above [`MAX_TERM_YEARS`] are rejected.
pub fn calculate_debt_service(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
) -> DealAnalysisResult<DebtServiceResult> {
    validate_loan(principal, annual_rate, term_years)?;
    let term = Decimal::from(term_years);

    let (yearly_payment, total_payment) = if monthly_rate(annual_rate).is_zero() {
        (principal / term, principal)
    } else {
        let monthly = monthly_payment(principal, annual_rate, term_years)?;
        let yearly = monthly
            .checked_mul(Decimal::from(MONTHS_PER_YEAR))
            .ok_or_else(|| DealAnalysisError::non_finite("yearly payment"))?;
        let total = yearly
            .checked_mul(term)
            .ok_or_else(|| DealAnalysisError::non_finite("total payment"))?;
        (yearly, total)
    };

    let rounded_payment = round2(yearly_payment);
    if rounded_payment <= Decimal::ZERO {
        return Err(DealAnalysisError::non_finite(
            "yearly payment (rounded to cents)",
        ));
    }

    // Interest is whatever the rounded total pays above the principal.
    let total_payment = round2(total_payment);
    Ok(DebtServiceResult {
        yearly_payments: vec![rounded_payment; term_years as usize],
        total_interest: total_payment - principal,
        total_payment,
    })
}

/// Year-by-year split of the level payment into interest and principal.
///
/// Interest accrues monthly on the outstanding balance; the final instalment
/// retires whatever balance remains so the schedule closes at zero.
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Percent,
    term_years: u32,
) -> DealAnalysisResult<Vec<AmortizationYear>> {
    let payment = monthly_payment(principal, annual_rate, term_years)?;
    let rate = monthly_rate(annual_rate);

    let mut balance = principal;
    let mut schedule = Vec::with_capacity(term_years as usize);

    for year in 1..=term_years {
        let mut interest_paid = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;

        for month in 1..=MONTHS_PER_YEAR {
            let interest = balance * rate;
            let is_final = year == term_years && month == MONTHS_PER_YEAR;
            let principal_part = if is_final {
                balance
            } else {
                (payment - interest).min(balance)
            };
            interest_paid += interest;
            principal_paid += principal_part;
            balance -= principal_part;
        }

        schedule.push(AmortizationYear {
            year,
            payment: round2(interest_paid + principal_paid),
            interest: round2(interest_paid),
            principal: round2(principal_paid),
            remaining_balance: round2(balance.max(Decimal::ZERO)),
        });
    }

    Ok(schedule)
}
