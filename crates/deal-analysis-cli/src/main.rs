mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::deal::{AnalyzeArgs, SensitivityArgs};
use commands::financing::DebtServiceArgs;
use commands::returns::{IrrArgs, MoicArgs, NpvArgs, PaybackArgs};
use commands::valuation::ValuationArgs;

/// M&A deal analysis
#[derive(Parser)]
#[command(
    name = "mna",
    version,
    about = "M&A deal analysis with decimal precision",
    long_about = "A CLI for evaluating acquisitions: EBITDA multiple valuation, amortising \
                  acquisition debt, IRR, MOIC, payback, NPV and a full deal analysis \
                  with an investment recommendation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enterprise value from EBITDA and a multiple
    Valuation(ValuationArgs),
    /// Level yearly debt service on an amortising loan
    DebtService(DebtServiceArgs),
    /// Internal rate of return of a cash flow series
    Irr(IrrArgs),
    /// Multiple on invested capital
    Moic(MoicArgs),
    /// Payback period of a cash flow series
    Payback(PaybackArgs),
    /// Net present value of a cash flow series
    Npv(NpvArgs),
    /// Run the full deal analysis from a JSON or YAML input
    Analyze(AnalyzeArgs),
    /// Valuation grid over multiple and EBITDA shifts
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("deal_analysis_core=debug,deal_analysis_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the result, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Valuation(args) => commands::valuation::run_valuation(args),
        Commands::DebtService(args) => commands::financing::run_debt_service(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Moic(args) => commands::returns::run_moic(args),
        Commands::Payback(args) => commands::returns::run_payback(args),
        Commands::Npv(args) => commands::returns::run_npv(args),
        Commands::Analyze(args) => commands::deal::run_analyze(args, cli.verbose),
        Commands::Sensitivity(args) => commands::deal::run_sensitivity(args),
        Commands::Version => {
            println!("mna {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
