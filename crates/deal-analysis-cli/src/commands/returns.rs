use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use deal_analysis_core::returns::{
    calculate_irr_with, calculate_moic, calculate_payback_period, IrrMethod, IrrSolverConfig,
};
use deal_analysis_core::time_value::calculate_npv;
use deal_analysis_core::types::{with_metadata, Money, Multiple, Percent};

use crate::input;

/// Root-finding strategy for `mna irr`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Newton,
    Bisection,
    /// Newton-Raphson, then bisection if Newton fails
    Hybrid,
}

impl From<MethodArg> for IrrMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Newton => IrrMethod::Newton,
            MethodArg::Bisection => IrrMethod::Bisection,
            MethodArg::Hybrid => IrrMethod::NewtonWithBisectionFallback,
        }
    }
}

fn read_request<T: serde::de::DeserializeOwned>(
    path: &Option<String>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_input(path)?));
    }
    match input::stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct IrrRequest {
    cash_flows: Vec<Money>,
    #[serde(default)]
    solver: IrrSolverConfig,
}

#[derive(Debug, Serialize)]
struct IrrReport {
    irr: Percent,
}

/// Arguments for IRR
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows, outlay first (comma-separated, e.g. "-1000,400,400,400")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Root-finding method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Iteration cap for the solver
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = match read_request::<IrrRequest>(&args.input)? {
        Some(request) => request,
        None => IrrRequest {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            solver: IrrSolverConfig::default(),
        },
    };
    if let Some(method) = args.method {
        request.solver = request.solver.with_method(method.into());
    }
    if let Some(max_iterations) = args.max_iterations {
        request.solver = request.solver.with_max_iterations(max_iterations);
    }
    request.solver = request.solver.with_trace(tracing::enabled!(tracing::Level::TRACE));

    let start = Instant::now();
    let irr = calculate_irr_with(&request.cash_flows, &request.solver)?;
    let output = with_metadata(
        "IRR: rate at which the NPV of the cash flows is zero",
        &request,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        IrrReport { irr },
    );
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// MOIC
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct MoicRequest {
    total_return: Money,
    initial_investment: Money,
}

#[derive(Debug, Serialize)]
struct MoicReport {
    moic: Multiple,
}

/// Arguments for MOIC
#[derive(Args)]
pub struct MoicArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total cash returned to the investor
    #[arg(long, allow_hyphen_values = true)]
    pub total_return: Option<Decimal>,

    /// Equity invested
    #[arg(long, allow_hyphen_values = true)]
    pub initial_investment: Option<Decimal>,
}

pub fn run_moic(args: MoicArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match read_request::<MoicRequest>(&args.input)? {
        Some(request) => request,
        None => MoicRequest {
            total_return: args
                .total_return
                .ok_or("--total-return is required (or provide --input)")?,
            initial_investment: args
                .initial_investment
                .ok_or("--initial-investment is required (or provide --input)")?,
        },
    };

    let start = Instant::now();
    let moic = calculate_moic(request.total_return, request.initial_investment)?;
    let output = with_metadata(
        "MOIC = total return / initial investment",
        &request,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        MoicReport { moic },
    );
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// Payback
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct CashFlowRequest {
    cash_flows: Vec<Money>,
}

/// Arguments for the payback period
#[derive(Args)]
pub struct PaybackArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows, outlay first (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_payback(args: PaybackArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match read_request::<CashFlowRequest>(&args.input)? {
        Some(request) => request,
        None => CashFlowRequest {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        },
    };

    let start = Instant::now();
    let payback = calculate_payback_period(&request.cash_flows)?;
    let mut warnings = Vec::new();
    if !payback.is_achieved {
        warnings.push("Cumulative cash flow never turns non-negative".to_string());
    }
    let output = with_metadata(
        "Payback: periods until cumulative cash flow turns non-negative, interpolated within the crossing period",
        &request,
        warnings,
        start.elapsed().as_micros() as u64,
        payback,
    );
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// NPV
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct NpvRequest {
    discount_rate_pct: Percent,
    cash_flows: Vec<Money>,
}

#[derive(Debug, Serialize)]
struct NpvReport {
    npv: Money,
}

/// Arguments for NPV
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate in percent (e.g. 10 for 10%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Periodic cash flows, period 0 undiscounted (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match read_request::<NpvRequest>(&args.input)? {
        Some(request) => request,
        None => NpvRequest {
            discount_rate_pct: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        },
    };

    let start = Instant::now();
    let npv = calculate_npv(request.discount_rate_pct, &request.cash_flows)?;
    let output = with_metadata(
        "NPV = sum of CF_t / (1 + r)^t",
        &request,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        NpvReport { npv },
    );
    Ok(serde_json::to_value(output)?)
}
