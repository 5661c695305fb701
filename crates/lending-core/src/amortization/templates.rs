//! Preset loan products offered on the agent calculator.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::calculator::{InterestMethod, LoanInput};
use crate::error::LendingError;
use crate::types::{Money, Percent};
use crate::LendingResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanTemplate {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub amount: Money,
    pub annual_rate_pct: Percent,
    pub term_months: u32,
    pub method: InterestMethod,
}

impl LoanTemplate {
    /// Calculator input for this product, with the default fee schedule.
    pub fn to_input(&self) -> LoanInput {
        LoanInput::new(self.amount, self.annual_rate_pct, self.term_months).with_method(self.method)
    }
}

const fn template(
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    amount: Decimal,
    annual_rate_pct: Decimal,
    term_months: u32,
    method: InterestMethod,
) -> LoanTemplate {
    LoanTemplate {
        slug,
        name,
        description,
        amount,
        annual_rate_pct,
        term_months,
        method,
    }
}

pub const LOAN_TEMPLATES: [LoanTemplate; 6] = [
    template("personal", "Personal Loan", "Standard personal financing", dec!(50000), dec!(15.5), 12, InterestMethod::ReducingBalance),
    template("business", "Business Loan", "SME expansion capital", dec!(200000), dec!(12.0), 24, InterestMethod::ReducingBalance),
    template("emergency", "Emergency Loan", "Quick cash assistance", dec!(25000), dec!(18.0), 6, InterestMethod::FlatRate),
    template("agricultural", "Agricultural Loan", "Farming & livestock", dec!(75000), dec!(13.5), 18, InterestMethod::ReducingBalance),
    template("education", "Education Loan", "School & university fees", dec!(40000), dec!(11.0), 36, InterestMethod::ReducingBalance),
    template("asset-financing", "Asset Financing", "Equipment & machinery", dec!(300000), dec!(14.0), 48, InterestMethod::ReducingBalance),
];

/// Look up a template by slug or display name, ignoring case.
pub fn find_template(key: &str) -> LendingResult<&'static LoanTemplate> {
    let key = key.trim();
    LOAN_TEMPLATES
        .iter()
        .find(|t| t.slug.eq_ignore_ascii_case(key) || t.name.eq_ignore_ascii_case(key))
        .ok_or_else(|| {
            LendingError::invalid(
                "template",
                format!(
                    "Unknown loan template '{key}' (expected one of: {})",
                    LOAN_TEMPLATES
                        .iter()
                        .map(|t| t.slug)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })
}
