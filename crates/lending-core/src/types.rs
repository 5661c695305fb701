use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Used for all internal math.
pub type Rate = Decimal;

/// Percentages as quoted on loan forms (15.5 = 15.5%). Convert with
/// [`pct_to_rate`] before doing arithmetic.
pub type Percent = Decimal;

/// Convert a quoted percentage into a decimal rate.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    ZWL,
    USD,
    ZAR,
    GBP,
    EUR,
    Other(String),
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::ZWL => "ZWL",
            Currency::USD => "USD",
            Currency::ZAR => "ZAR",
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
            Currency::Other(code) => code.as_str(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for w in &warnings {
        tracing::warn!(methodology, warning = %w, "calculation warning");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
