use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::amortization::comparison::{self, RateImpactInput, TermComparisonInput};

use crate::input;

/// Arguments for term comparison
#[derive(Args)]
pub struct CompareTermsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Terms in months (comma-separated, default "6,12,18,24")
    #[arg(long, value_delimiter = ',')]
    pub terms: Option<Vec<u32>>,
}

pub fn run_compare_terms(args: CompareTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms_input: TermComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        TermComparisonInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            terms: args.terms.unwrap_or_default(),
        }
    };

    let result = comparison::compare_terms(&terms_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for rate impact analysis
#[derive(Args)]
pub struct RateImpactArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Currently quoted annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Candidate rates in percent (comma-separated, default "10,12.5,15,17.5,20")
    #[arg(long, value_delimiter = ',')]
    pub rates: Option<Vec<Decimal>>,
}

pub fn run_rate_impact(args: RateImpactArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let impact_input: RateImpactInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RateImpactInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            current_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            rates: args.rates.unwrap_or_default(),
        }
    };

    let result = comparison::rate_impact(&impact_input)?;
    Ok(serde_json::to_value(result)?)
}
