use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use deal_analysis_core::types::{with_metadata, Money, Multiple};
use deal_analysis_core::valuation::calculate_valuation;

use crate::input;

#[derive(Debug, Serialize, Deserialize)]
struct ValuationRequest {
    ebitda: Money,
    multiple: Multiple,
}

#[derive(Debug, Serialize)]
struct ValuationReport {
    enterprise_value: Money,
}

/// Arguments for a multiple-based valuation
#[derive(Args)]
pub struct ValuationArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// LTM EBITDA
    #[arg(long, allow_hyphen_values = true)]
    pub ebitda: Option<Decimal>,

    /// EV/EBITDA multiple
    #[arg(long, allow_hyphen_values = true)]
    pub multiple: Option<Decimal>,
}

pub fn run_valuation(args: ValuationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ValuationRequest = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ValuationRequest {
            ebitda: args.ebitda.ok_or("--ebitda is required (or provide --input)")?,
            multiple: args.multiple.ok_or("--multiple is required (or provide --input)")?,
        }
    };

    let start = Instant::now();
    let enterprise_value = calculate_valuation(request.ebitda, request.multiple)?;
    let output = with_metadata(
        "Enterprise value = LTM EBITDA x EV/EBITDA multiple",
        &request,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        ValuationReport { enterprise_value },
    );
    Ok(serde_json::to_value(output)?)
}
