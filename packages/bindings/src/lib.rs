use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use lending_core::amortization::{calculator, comparison, templates};
use lending_core::currency::{self, CurrencyAmount};
use lending_core::repayments::tracker::{self, RepaymentQuery, RepaymentRecord};
use lending_core::Currency;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    let input: calculator::LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calculator::calculate_loan(&input).map_err(to_napi_error)?;
    to_json(&output)
}

#[derive(Deserialize)]
struct FeesRequest {
    principal: Decimal,
    #[serde(default = "default_processing_fee_pct")]
    processing_fee_pct: Decimal,
    #[serde(default = "default_insurance_fee_pct")]
    insurance_fee_pct: Decimal,
}

fn default_processing_fee_pct() -> Decimal {
    calculator::DEFAULT_PROCESSING_FEE_PCT
}

fn default_insurance_fee_pct() -> Decimal {
    calculator::DEFAULT_INSURANCE_FEE_PCT
}

#[napi]
pub fn calculate_fees(input_json: String) -> NapiResult<String> {
    let req: FeesRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        calculator::calculate_fees(req.principal, req.processing_fee_pct, req.insurance_fee_pct)
            .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn loan_templates() -> NapiResult<String> {
    to_json(&templates::LOAN_TEMPLATES[..])
}

#[napi]
pub fn loan_template(name: String) -> NapiResult<String> {
    let template = templates::find_template(&name).map_err(to_napi_error)?;
    to_json(template)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_terms(input_json: String) -> NapiResult<String> {
    let input: comparison::TermComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_terms(&input).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn rate_impact(input_json: String) -> NapiResult<String> {
    let input: comparison::RateImpactInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::rate_impact(&input).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn compare_methods(input_json: String) -> NapiResult<String> {
    let input: calculator::LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_methods(&input).map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Repayments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FilterRequest {
    records: Vec<RepaymentRecord>,
    #[serde(default)]
    query: RepaymentQuery,
}

#[napi]
pub fn filter_repayments(input_json: String) -> NapiResult<String> {
    let req: FilterRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    to_json(&tracker::filter_repayments(&req.records, &req.query))
}

#[napi]
pub fn summarize_repayments(input_json: String) -> NapiResult<String> {
    let input: tracker::RepaymentSummaryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = tracker::summarize_repayments(&input).map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ConvertRequest {
    amount: Decimal,
    #[serde(default)]
    currency: Currency,
    #[serde(default = "default_local_per_usd")]
    local_per_usd: Decimal,
}

fn default_local_per_usd() -> Decimal {
    currency::DEFAULT_ZWL_PER_USD
}

#[napi]
pub fn convert_to_usd(input_json: String) -> NapiResult<String> {
    let req: ConvertRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = CurrencyAmount {
        amount: req.amount,
        currency: req.currency,
    };
    let output = currency::convert_to_usd(&value, req.local_per_usd).map_err(to_napi_error)?;
    to_json(&output)
}
