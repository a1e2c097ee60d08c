use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use deal_analysis_core::financing::{
    amortization_schedule, calculate_debt_service, AmortizationYear, DebtServiceResult,
};
use deal_analysis_core::types::{with_metadata, Money, Percent};

use crate::input;

#[derive(Debug, Serialize, Deserialize)]
struct DebtServiceRequest {
    principal: Money,
    interest_rate_pct: Percent,
    term_years: u32,
}

#[derive(Debug, Serialize)]
struct DebtServiceReport {
    #[serde(flatten)]
    service: DebtServiceResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<AmortizationYear>>,
}

/// Arguments for acquisition debt service
#[derive(Args)]
pub struct DebtServiceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, allow_hyphen_values = true)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8 for 8%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Amortisation term in years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Include the year-by-year interest / principal breakdown
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_debt_service(args: DebtServiceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DebtServiceRequest = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        DebtServiceRequest {
            principal: args.principal.ok_or("--principal is required (or provide --input)")?,
            interest_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
        }
    };

    let start = Instant::now();
    let service = calculate_debt_service(
        request.principal,
        request.interest_rate_pct,
        request.term_years,
    )?;
    let schedule = if args.schedule {
        Some(amortization_schedule(
            request.principal,
            request.interest_rate_pct,
            request.term_years,
        )?)
    } else {
        None
    };

    let output = with_metadata(
        "Level payment on a fixed-rate loan amortised monthly, reported per year",
        &request,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        DebtServiceReport { service, schedule },
    );
    Ok(serde_json::to_value(output)?)
}
