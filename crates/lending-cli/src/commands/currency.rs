use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use lending_core::currency;

use crate::config::CliConfig;

/// Arguments for currency conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Amount in local currency (ZWL)
    #[arg(long)]
    pub amount: Decimal,

    /// Local currency units per USD (defaults to config, then 38500)
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_convert(args: ConvertArgs, cfg: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let rate = args.rate.unwrap_or(cfg.zwl_per_usd);
    let usd = currency::to_usd(args.amount, rate)?;
    Ok(json!({
        "result": {
            "amount_zwl": args.amount,
            "zwl_per_usd": rate,
            "amount_usd": usd,
        }
    }))
}
