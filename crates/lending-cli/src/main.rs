mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use std::process;

use commands::calculator::{CalculateArgs, CompareMethodsArgs, FeesArgs, TemplatesArgs};
use commands::comparison::{CompareTermsArgs, RateImpactArgs};
use commands::currency::ConvertArgs;
use commands::repayments::{RepaymentSummaryArgs, RepaymentsArgs};

/// Loan amortization, fee and repayment calculations
#[derive(Parser)]
#[command(
    name = "lcalc",
    version,
    about = "Loan amortization, fee and repayment calculations",
    long_about = "A CLI for loan officers: instalments and full amortization schedules \
                  (reducing balance or flat rate), up-front fee deductions, APR, term and \
                  rate comparisons, and repayment tracking, all in decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to the config file setting, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Path to a YAML defaults file
    #[arg(long, global = true, env = "LCALC_CONFIG")]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate instalment, totals, fees and the amortization schedule
    Calculate(CalculateArgs),
    /// Compare reducing-balance and flat-rate costs for the same loan
    CompareMethods(CompareMethodsArgs),
    /// Compare monthly payments across loan terms
    CompareTerms(CompareTermsArgs),
    /// Show how the monthly payment moves with the interest rate
    RateImpact(RateImpactArgs),
    /// Up-front fee deductions and net disbursement
    Fees(FeesArgs),
    /// List the preset loan products
    Templates(TemplatesArgs),
    /// Convert a local-currency amount to USD
    Convert(ConvertArgs),
    /// Search and filter repayment records
    Repayments(RepaymentsArgs),
    /// Totals, collection rate and overdue penalties for repayment records
    RepaymentSummary(RepaymentSummaryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = match config::CliConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::calculator::run_calculate(args, &cfg),
        Commands::CompareMethods(args) => commands::calculator::run_compare_methods(args, &cfg),
        Commands::CompareTerms(args) => commands::comparison::run_compare_terms(args),
        Commands::RateImpact(args) => commands::comparison::run_rate_impact(args),
        Commands::Fees(args) => commands::calculator::run_fees(args, &cfg),
        Commands::Templates(args) => commands::calculator::run_templates(args),
        Commands::Convert(args) => commands::currency::run_convert(args, &cfg),
        Commands::Repayments(args) => commands::repayments::run_repayments(args),
        Commands::RepaymentSummary(args) => commands::repayments::run_repayment_summary(args, &cfg),
        Commands::Version => {
            println!("lcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let format = cli.output.or(cfg.output).unwrap_or(OutputFormat::Json);

    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
