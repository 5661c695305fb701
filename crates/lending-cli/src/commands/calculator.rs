use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use lending_core::amortization::calculator::{
    self, InterestMethod, LoanInput, TermUnit,
};
use lending_core::amortization::comparison;
use lending_core::amortization::templates::{self, LOAN_TEMPLATES};
use lending_core::currency;

use crate::config::CliConfig;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Reducing balance (annuity)
    Reducing,
    /// Flat rate (simple interest)
    Flat,
}

impl From<MethodArg> for InterestMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Reducing => InterestMethod::ReducingBalance,
            MethodArg::Flat => InterestMethod::FlatRate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TermUnitArg {
    Months,
    Years,
}

impl From<TermUnitArg> for TermUnit {
    fn from(u: TermUnitArg) -> Self {
        match u {
            TermUnitArg::Months => TermUnit::Months,
            TermUnitArg::Years => TermUnit::Years,
        }
    }
}

/// Loan parameters shared by every loan-level command
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Start from a preset product (personal, business, emergency, ...)
    #[arg(long)]
    pub template: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 15.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term, in --term-unit
    #[arg(long)]
    pub term: Option<u32>,

    /// Unit of --term
    #[arg(long, value_enum)]
    pub term_unit: Option<TermUnitArg>,

    /// Interest calculation method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Processing fee in percent of principal
    #[arg(long)]
    pub processing_fee: Option<Decimal>,

    /// Insurance fee in percent of principal
    #[arg(long)]
    pub insurance_fee: Option<Decimal>,

    /// Interest-only months at the start of the loan
    #[arg(long)]
    pub grace_period: Option<u32>,

    /// Round instalments to this many decimal places
    #[arg(long)]
    pub round: Option<u32>,
}

/// Resolve loan input: JSON file, then piped stdin, then template and flags.
pub fn build_loan_input(args: &LoanArgs, cfg: &CliConfig) -> Result<LoanInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    loan_from_flags(args, cfg)
}

/// Build loan input from a template and/or individual flags.
fn loan_from_flags(args: &LoanArgs, cfg: &CliConfig) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let mut loan = match args.template {
        Some(ref name) => templates::find_template(name)?.to_input(),
        None => {
            let principal = args
                .principal
                .ok_or("--principal is required (or provide --input / --template)")?;
            let rate = args
                .rate
                .ok_or("--rate is required (or provide --input / --template)")?;
            let term = args
                .term
                .ok_or("--term is required (or provide --input / --template)")?;
            LoanInput::new(principal, rate, term)
        }
    };

    loan.processing_fee_pct = cfg.processing_fee_pct;
    loan.insurance_fee_pct = cfg.insurance_fee_pct;

    // Explicit flags override template values and config defaults.
    if let Some(p) = args.principal {
        loan.principal = p;
    }
    if let Some(r) = args.rate {
        loan.annual_rate_pct = r;
    }
    if let Some(t) = args.term {
        loan.term = t;
    }
    if let Some(u) = args.term_unit {
        loan.term_unit = u.into();
    }
    if let Some(m) = args.method {
        loan.method = m.into();
    }
    if let Some(f) = args.processing_fee {
        loan.processing_fee_pct = f;
    }
    if let Some(f) = args.insurance_fee {
        loan.insurance_fee_pct = f;
    }
    if let Some(g) = args.grace_period {
        loan.grace_period_months = g;
    }
    if args.round.is_some() {
        loan.rounding_dp = args.round;
    }

    Ok(loan)
}

/// Arguments for the loan calculator
#[derive(Args)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Only show the first N schedule rows
    #[arg(long)]
    pub preview: Option<usize>,

    /// Add USD equivalents at the configured exchange rate
    #[arg(long)]
    pub usd: bool,
}

pub fn run_calculate(args: CalculateArgs, cfg: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = build_loan_input(&args.loan, cfg)?;
    let mut result = calculator::calculate_loan(&loan)?;

    if let Some(n) = args.preview {
        let total = result.result.schedule.len();
        if n < total {
            result.result.schedule.truncate(n);
            result
                .warnings
                .push(format!("Showing first {n} payments of {total} total payments"));
        }
    }

    let mut value = serde_json::to_value(&result)?;
    if args.usd {
        let out = &result.result;
        value["usd_equivalent"] = json!({
            "zwl_per_usd": cfg.zwl_per_usd,
            "periodic_payment": currency::to_usd(out.periodic_payment, cfg.zwl_per_usd)?,
            "total_payment": currency::to_usd(out.total_payment, cfg.zwl_per_usd)?,
            "net_disbursement": currency::to_usd(out.fees.net_disbursement, cfg.zwl_per_usd)?,
        });
    }
    Ok(value)
}

/// Arguments for the interest method comparison
#[derive(Args)]
pub struct CompareMethodsArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_compare_methods(
    args: CompareMethodsArgs,
    cfg: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = build_loan_input(&args.loan, cfg)?;
    let result = comparison::compare_methods(&loan)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for fee deductions
#[derive(Args)]
pub struct FeesArgs {
    /// Loan amount
    #[arg(long)]
    pub principal: Decimal,

    /// Processing fee in percent (defaults to config)
    #[arg(long)]
    pub processing_fee: Option<Decimal>,

    /// Insurance fee in percent (defaults to config)
    #[arg(long)]
    pub insurance_fee: Option<Decimal>,
}

pub fn run_fees(args: FeesArgs, cfg: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    if args.principal <= Decimal::ZERO {
        return Err("--principal must be positive".into());
    }
    let fees = calculator::calculate_fees(
        args.principal,
        args.processing_fee.unwrap_or(cfg.processing_fee_pct),
        args.insurance_fee.unwrap_or(cfg.insurance_fee_pct),
    )?;
    Ok(json!({ "result": fees }))
}

/// Arguments for listing preset products
#[derive(Args)]
pub struct TemplatesArgs {
    /// Show a single template by slug or name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run_templates(args: TemplatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.name {
        Some(ref name) => Ok(json!({ "result": templates::find_template(name)? })),
        None => Ok(serde_json::to_value(&LOAN_TEMPLATES[..])?),
    }
}
