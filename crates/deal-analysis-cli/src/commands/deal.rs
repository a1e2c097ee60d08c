use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use deal_analysis_core::deal::{analyze_deal, DealAnalysisInput};
use deal_analysis_core::valuation::sensitivity::{valuation_sensitivity, SensitivityInput};

use crate::input;

/// Arguments for the full deal analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML deal file (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs, verbose: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let mut deal: DealAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <deal.json|deal.yaml> or stdin required for deal analysis".into());
    };
    deal.debug |= verbose;

    tracing::info!(
        company = deal.company_name.as_deref().unwrap_or("unnamed"),
        years = deal.projections.len(),
        "analysing deal"
    );
    let result = analyze_deal(&deal)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the valuation sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Base EBITDA
    #[arg(long)]
    pub ebitda: Option<Decimal>,

    /// Base EV/EBITDA multiple
    #[arg(long)]
    pub multiple: Option<Decimal>,

    /// Percentage shifts applied to the multiple (comma-separated, default -20,-10,0,10,20)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub multiple_shifts: Option<Vec<Decimal>>,

    /// Percentage shifts applied to EBITDA (comma-separated, default -20,-10,0,10,20)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub ebitda_shifts: Option<Vec<Decimal>>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sensitivity_input: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let mut value = serde_json::json!({
            "base_ebitda": args.ebitda.ok_or("--ebitda is required (or provide --input)")?,
            "base_multiple": args.multiple.ok_or("--multiple is required (or provide --input)")?,
        });
        if let Some(shifts) = args.multiple_shifts {
            value["multiple_shifts_pct"] = serde_json::to_value(shifts)?;
        }
        if let Some(shifts) = args.ebitda_shifts {
            value["ebitda_shifts_pct"] = serde_json::to_value(shifts)?;
        }
        // missing shift axes take the input type's defaults
        serde_json::from_value(value)?
    };

    let result = valuation_sensitivity(&sensitivity_input)?;
    Ok(serde_json::to_value(result)?)
}
