use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use lending_core::amortization::calculator::{
    DEFAULT_INSURANCE_FEE_PCT, DEFAULT_PROCESSING_FEE_PCT,
};
use lending_core::currency::DEFAULT_ZWL_PER_USD;
use lending_core::repayments::tracker::DEFAULT_PENALTY_RATE_PCT;

use crate::OutputFormat;

/// Branch-level defaults, read from YAML:
///
/// ```yaml
/// processing_fee_pct: 2.5
/// insurance_fee_pct: 1
/// penalty_rate_pct: 5
/// zwl_per_usd: 38500
/// output: table
/// ```
///
/// Every key is optional; missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub processing_fee_pct: Decimal,
    pub insurance_fee_pct: Decimal,
    pub penalty_rate_pct: Decimal,
    pub zwl_per_usd: Decimal,
    pub output: Option<OutputFormat>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            processing_fee_pct: DEFAULT_PROCESSING_FEE_PCT,
            insurance_fee_pct: DEFAULT_INSURANCE_FEE_PCT,
            penalty_rate_pct: DEFAULT_PENALTY_RATE_PCT,
            zwl_per_usd: DEFAULT_ZWL_PER_USD,
            output: None,
        }
    }
}

impl CliConfig {
    /// Load from `path` if given, otherwise use the built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(path) = path else {
            return Ok(CliConfig::default());
        };
        let p = Path::new(path);
        let contents = fs::read_to_string(p)
            .map_err(|e| format!("Failed to read config '{}': {}", p.display(), e))?;
        let cfg = Self::from_yaml(&contents)
            .map_err(|e| format!("Failed to parse config '{}': {}", p.display(), e))?;
        tracing::debug!(path = %p.display(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(CliConfig::default());
        }
        serde_yaml::from_str(contents)
    }
}
