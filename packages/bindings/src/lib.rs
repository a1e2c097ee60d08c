use napi::{Result as NapiResult, Status};
use napi_derive::napi;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use deal_analysis_core::validation::{finite_decimal, finite_decimals};
use deal_analysis_core::{DealAnalysisError, ErrorKind};

/// Engine errors keep their kind: bad input surfaces as `InvalidArg`.
fn to_napi_error(e: DealAnalysisError) -> napi::Error {
    let status = match e.kind() {
        ErrorKind::InvalidInput => Status::InvalidArg,
        ErrorKind::CalculationFailure => Status::GenericFailure,
    };
    napi::Error::new(status, e.to_string())
}

/// Convert any other Display error (serde) into a napi::Error.
fn to_reason(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn to_host(value: Decimal) -> NapiResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| napi::Error::from_reason(format!("{value} is not representable as f64")))
}

fn to_host_vec(values: &[Decimal]) -> NapiResult<Vec<f64>> {
    values.iter().copied().map(to_host).collect()
}

fn decimal(value: f64, field: &str) -> NapiResult<Decimal> {
    finite_decimal(value, field).map_err(to_napi_error)
}

fn decimals(values: &[f64], field: &str) -> NapiResult<Vec<Decimal>> {
    finite_decimals(values, field).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Engine operations on host numbers
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_valuation(ebitda: f64, multiple: f64) -> NapiResult<f64> {
    let value = deal_analysis_core::valuation::calculate_valuation(
        decimal(ebitda, "ebitda")?,
        decimal(multiple, "multiple")?,
    )
    .map_err(to_napi_error)?;
    to_host(value)
}

#[napi(object)]
pub struct DebtService {
    pub yearly_payments: Vec<f64>,
    pub total_interest: f64,
    pub total_payment: f64,
}

#[napi]
pub fn calculate_debt_service(
    principal: f64,
    interest_rate: f64,
    term_years: u32,
) -> NapiResult<DebtService> {
    let result = deal_analysis_core::financing::calculate_debt_service(
        decimal(principal, "principal")?,
        decimal(interest_rate, "interest_rate")?,
        term_years,
    )
    .map_err(to_napi_error)?;
    Ok(DebtService {
        yearly_payments: to_host_vec(&result.yearly_payments)?,
        total_interest: to_host(result.total_interest)?,
        total_payment: to_host(result.total_payment)?,
    })
}

#[napi]
pub fn calculate_irr(cash_flows: Vec<f64>) -> NapiResult<f64> {
    let flows = decimals(&cash_flows, "cash_flows")?;
    let irr = deal_analysis_core::returns::calculate_irr(&flows).map_err(to_napi_error)?;
    to_host(irr)
}

#[napi]
pub fn calculate_moic(total_return: f64, initial_investment: f64) -> NapiResult<f64> {
    let moic = deal_analysis_core::returns::calculate_moic(
        decimal(total_return, "total_return")?,
        decimal(initial_investment, "initial_investment")?,
    )
    .map_err(to_napi_error)?;
    to_host(moic)
}

#[napi(object)]
pub struct PaybackPeriod {
    pub years: f64,
    pub is_achieved: bool,
    pub remaining_balance: Option<f64>,
}

#[napi]
pub fn calculate_payback_period(cash_flows: Vec<f64>) -> NapiResult<PaybackPeriod> {
    let flows = decimals(&cash_flows, "cash_flows")?;
    let result =
        deal_analysis_core::returns::calculate_payback_period(&flows).map_err(to_napi_error)?;
    Ok(PaybackPeriod {
        years: to_host(result.years)?,
        is_achieved: result.is_achieved,
        remaining_balance: result.remaining_balance.map(to_host).transpose()?,
    })
}

#[napi]
pub fn calculate_npv(discount_rate: f64, cash_flows: Vec<f64>) -> NapiResult<f64> {
    let npv = deal_analysis_core::time_value::calculate_npv(
        decimal(discount_rate, "discount_rate")?,
        &decimals(&cash_flows, "cash_flows")?,
    )
    .map_err(to_napi_error)?;
    to_host(npv)
}

// ---------------------------------------------------------------------------
// JSON in / JSON out
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_deal(input_json: String) -> NapiResult<String> {
    let input: deal_analysis_core::deal::DealAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_reason)?;
    let output = deal_analysis_core::deal::analyze_deal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_reason)
}

#[napi]
pub fn valuation_sensitivity(input_json: String) -> NapiResult<String> {
    let input: deal_analysis_core::valuation::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_reason)?;
    let output = deal_analysis_core::valuation::sensitivity::valuation_sensitivity(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_reason)
}

#[derive(Deserialize)]
struct LoanInput {
    principal: Decimal,
    interest_rate_pct: Decimal,
    term_years: u32,
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let loan: LoanInput = serde_json::from_str(&input_json).map_err(to_reason)?;
    let schedule = deal_analysis_core::financing::amortization_schedule(
        loan.principal,
        loan.interest_rate_pct,
        loan.term_years,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_reason)
}
