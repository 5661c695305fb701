use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::repayments::tracker::{
    self, RepaymentQuery, RepaymentRecord, RepaymentSummaryInput,
};

use crate::config::CliConfig;
use crate::input;

/// Load records from a file or stdin. Accepts either a bare array or an
/// object with a `records` array.
fn read_records(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_json_value(path);
    }
    input::stdin::read_stdin()?
        .ok_or_else(|| "--input <file.json> or stdin required for repayment records".into())
}

fn records_from_value(value: Value) -> Result<Vec<RepaymentRecord>, Box<dyn std::error::Error>> {
    let records = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("records")
            .ok_or("Input object has no 'records' array")?,
        _ => return Err("Repayment input must be an array or an object with 'records'".into()),
    };
    Ok(serde_json::from_value(records)?)
}

/// Arguments for repayment search
#[derive(Args)]
pub struct RepaymentsArgs {
    /// Path to JSON file of repayment records
    #[arg(long)]
    pub input: Option<String>,

    /// Search client name or loan id
    #[arg(long, default_value = "")]
    pub search: String,

    /// Status filter: all, paid, pending, overdue
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Only records handled by this agent
    #[arg(long)]
    pub agent: Option<String>,
}

pub fn run_repayments(args: RepaymentsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records = records_from_value(read_records(args.input.as_deref())?)?;
    let query = RepaymentQuery {
        search: args.search,
        status: tracker::parse_status_filter(&args.status)?,
        agent: args.agent,
    };
    let hits = tracker::filter_repayments(&records, &query);
    tracing::debug!(matched = hits.len(), total = records.len(), "filtered repayments");
    Ok(serde_json::to_value(hits)?)
}

/// Arguments for the repayment summary
#[derive(Args)]
pub struct RepaymentSummaryArgs {
    /// Path to JSON file of repayment records (or a full summary input)
    #[arg(long)]
    pub input: Option<String>,

    /// Measure days overdue as of this date (YYYY-MM-DD, default today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Late penalty in percent of the overdue instalment (defaults to config)
    #[arg(long)]
    pub penalty_rate: Option<Decimal>,
}

pub fn run_repayment_summary(
    args: RepaymentSummaryArgs,
    cfg: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let value = read_records(args.input.as_deref())?;

    let mut summary_input: RepaymentSummaryInput = match value {
        Value::Object(ref map) if map.contains_key("as_of") => serde_json::from_value(value)?,
        other => RepaymentSummaryInput {
            records: records_from_value(other)?,
            as_of: Local::now().date_naive(),
            penalty_rate_pct: cfg.penalty_rate_pct,
        },
    };
    if let Some(as_of) = args.as_of {
        summary_input.as_of = as_of;
    }
    if let Some(rate) = args.penalty_rate {
        summary_input.penalty_rate_pct = rate;
    }

    let result = tracker::summarize_repayments(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}
