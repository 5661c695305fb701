//! Loan calculator: periodic instalment, fee deductions, and a full
//! period-by-period amortization schedule.
//!
//! Two interest methods are supported:
//! 1. **Reducing balance** -- standard annuity; interest accrues on the
//!    outstanding balance each month.
//! 2. **Flat rate** -- simple interest on the original principal for the
//!    whole term, spread evenly over the instalments.
//!
//! Rates and fees are quoted as percentages (15.5 = 15.5%) the way loan
//! officers enter them, and converted to decimal rates internally.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LendingError;
use crate::time_value;
use crate::types::*;
use crate::LendingResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// 100 years of monthly instalments.
pub const MAX_PAYMENTS: u32 = 1200;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Largest rounding precision accepted for `rounding_dp`.
const MAX_ROUNDING_DP: u32 = 10;

/// Largest loan amount accepted.
pub const MAX_PRINCIPAL: Decimal = dec!(1_000_000_000_000_000);

/// Largest annual rate accepted, in percent.
pub const MAX_ANNUAL_RATE_PCT: Decimal = dec!(1000);

pub const DEFAULT_PROCESSING_FEE_PCT: Decimal = dec!(2);
pub const DEFAULT_INSURANCE_FEE_PCT: Decimal = dec!(1);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Unit the loan term is quoted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermUnit {
    #[default]
    Months,
    Years,
}

/// Interest calculation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMethod {
    /// Annuity on the outstanding balance (compound).
    #[default]
    #[serde(alias = "reducing")]
    ReducingBalance,
    /// Simple interest on the original principal.
    #[serde(alias = "flat")]
    FlatRate,
}

impl InterestMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InterestMethod::ReducingBalance => "Reducing Balance",
            InterestMethod::FlatRate => "Flat Rate",
        }
    }
}

fn default_processing_fee_pct() -> Percent {
    DEFAULT_PROCESSING_FEE_PCT
}

fn default_insurance_fee_pct() -> Percent {
    DEFAULT_INSURANCE_FEE_PCT
}

/// Loan parameters as captured on the calculator form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed.
    pub principal: Money,
    /// Annual interest rate as a percentage (15.5 = 15.5%).
    pub annual_rate_pct: Percent,
    /// Term length, in `term_unit`.
    pub term: u32,
    #[serde(default)]
    pub term_unit: TermUnit,
    #[serde(default)]
    pub method: InterestMethod,
    /// Processing fee deducted up front, as a percentage of principal.
    #[serde(default = "default_processing_fee_pct")]
    pub processing_fee_pct: Percent,
    /// Credit insurance deducted up front, as a percentage of principal.
    #[serde(default = "default_insurance_fee_pct")]
    pub insurance_fee_pct: Percent,
    /// Leading months during which only interest is paid.
    #[serde(default)]
    pub grace_period_months: u32,
    /// Round instalments and interest to this many decimal places.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding_dp: Option<u32>,
}

impl LoanInput {
    /// Monthly-term reducing-balance loan with the default fee schedule.
    pub fn new(principal: Money, annual_rate_pct: Percent, term_months: u32) -> Self {
        LoanInput {
            principal,
            annual_rate_pct,
            term: term_months,
            term_unit: TermUnit::Months,
            method: InterestMethod::ReducingBalance,
            processing_fee_pct: DEFAULT_PROCESSING_FEE_PCT,
            insurance_fee_pct: DEFAULT_INSURANCE_FEE_PCT,
            grace_period_months: 0,
            rounding_dp: None,
        }
    }

    pub fn with_method(mut self, method: InterestMethod) -> Self {
        self.method = method;
        self
    }

    /// Number of monthly instalments implied by `term` and `term_unit`.
    pub fn number_of_payments(&self) -> LendingResult<u32> {
        let n = match self.term_unit {
            TermUnit::Months => Some(self.term),
            TermUnit::Years => self.term.checked_mul(12),
        };
        match n {
            Some(n) if n <= MAX_PAYMENTS => Ok(n),
            _ => Err(LendingError::invalid(
                "term",
                format!("Term must not exceed {MAX_PAYMENTS} monthly payments"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A single instalment in the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Closing balance after this instalment (never negative).
    pub balance: Money,
}

/// Up-front deductions from the disbursed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub processing_amount: Money,
    pub insurance_amount: Money,
    pub total_fees: Money,
    pub net_disbursement: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCalculatorOutput {
    pub loan_amount: Money,
    pub method: InterestMethod,
    pub number_of_payments: u32,
    pub monthly_rate: Rate,
    /// Regular amortizing instalment (after any grace period).
    pub periodic_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub interest_pct_of_principal: Percent,
    #[serde(flatten)]
    pub fees: FeeBreakdown,
    /// Everything the borrower pays: instalments plus up-front fees.
    pub total_cost: Money,
    /// Nominal annual rate implied by the net disbursement and instalments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_annual_rate: Option<Rate>,
    pub schedule: Vec<ScheduleRow>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Calculate instalment, totals, fees and the full repayment schedule.
pub fn calculate_loan(input: &LoanInput) -> LendingResult<ComputationOutput<LoanCalculatorOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_loan_input(input)?;
    let n = input.number_of_payments()?;

    tracing::debug!(
        principal = %input.principal,
        rate_pct = %input.annual_rate_pct,
        payments = n,
        method = ?input.method,
        "calculating loan schedule"
    );

    if input.annual_rate_pct > dec!(100) {
        warnings.push(format!(
            "Annual rate of {}% is unusually high; check the rate is quoted as a percentage",
            input.annual_rate_pct
        ));
    }
    if input.grace_period_months > 0 {
        warnings.push(format!(
            "First {} instalment(s) are interest-only; principal amortizes over the remaining {}",
            input.grace_period_months,
            n - input.grace_period_months
        ));
    }

    let annual_rate = pct_to_rate(input.annual_rate_pct);
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;

    let (schedule, periodic_payment, total_interest) = match input.method {
        InterestMethod::ReducingBalance => reducing_balance_schedule(input, monthly_rate, n)?,
        InterestMethod::FlatRate => flat_rate_schedule(input, annual_rate, n)?,
    };

    let total_payment = match input.method {
        InterestMethod::ReducingBalance => schedule.iter().map(|r| r.payment).sum(),
        InterestMethod::FlatRate => input.principal + total_interest,
    };
    let total_interest = match input.method {
        InterestMethod::ReducingBalance => total_payment - input.principal,
        InterestMethod::FlatRate => total_interest,
    };

    let fees = calculate_fees(
        input.principal,
        input.processing_fee_pct,
        input.insurance_fee_pct,
    )?;

    let (apr, effective_annual_rate) =
        match effective_rates(fees.net_disbursement, &schedule, monthly_rate) {
            Ok((apr, ear)) => (Some(apr), Some(ear)),
            Err(e) => {
                warnings.push(format!("APR omitted: {e}"));
                (None, None)
            }
        };

    let output = LoanCalculatorOutput {
        loan_amount: input.principal,
        method: input.method,
        number_of_payments: n,
        monthly_rate,
        periodic_payment,
        total_payment,
        total_interest,
        interest_pct_of_principal: total_interest / input.principal * dec!(100),
        total_cost: total_payment + fees.total_fees,
        fees,
        apr,
        effective_annual_rate,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        match input.method {
            InterestMethod::ReducingBalance => "Reducing-balance amortization (annuity)",
            InterestMethod::FlatRate => "Flat-rate amortization (simple interest)",
        },
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Up-front fee deductions and the amount actually paid out to the borrower.
pub fn calculate_fees(
    principal: Money,
    processing_fee_pct: Percent,
    insurance_fee_pct: Percent,
) -> LendingResult<FeeBreakdown> {
    if processing_fee_pct < Decimal::ZERO {
        return Err(LendingError::invalid(
            "processing_fee_pct",
            "Processing fee cannot be negative",
        ));
    }
    if insurance_fee_pct < Decimal::ZERO {
        return Err(LendingError::invalid(
            "insurance_fee_pct",
            "Insurance fee cannot be negative",
        ));
    }

    let fee = |pct: Percent| principal.checked_mul(pct_to_rate(pct));
    let (processing_amount, insurance_amount, total_fees) =
        match (fee(processing_fee_pct), fee(insurance_fee_pct)) {
            (Some(p), Some(i)) => match p.checked_add(i) {
                Some(total) => (p, i, total),
                None => return Err(fees_out_of_range()),
            },
            _ => return Err(fees_out_of_range()),
        };

    Ok(FeeBreakdown {
        processing_amount,
        insurance_amount,
        total_fees,
        net_disbursement: principal - total_fees,
    })
}

fn fees_out_of_range() -> LendingError {
    LendingError::FinancialImpossibility("Fee amounts exceed the representable range".into())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_loan_input(input: &LoanInput) -> LendingResult<()> {
    validate_principal_and_rate(input.principal, input.annual_rate_pct)?;
    if input.term == 0 {
        return Err(LendingError::invalid("term", "Loan term must be at least 1"));
    }
    if input.processing_fee_pct < Decimal::ZERO {
        return Err(LendingError::invalid(
            "processing_fee_pct",
            "Processing fee cannot be negative",
        ));
    }
    if input.insurance_fee_pct < Decimal::ZERO {
        return Err(LendingError::invalid(
            "insurance_fee_pct",
            "Insurance fee cannot be negative",
        ));
    }
    let total_fee_pct = input.processing_fee_pct.checked_add(input.insurance_fee_pct);
    if !matches!(total_fee_pct, Some(pct) if pct < dec!(100)) {
        return Err(LendingError::FinancialImpossibility(
            "Fees consume the entire principal; nothing would be disbursed".into(),
        ));
    }

    let n = input.number_of_payments()?;
    if input.grace_period_months >= n {
        return Err(LendingError::invalid(
            "grace_period_months",
            format!("Grace period must be shorter than the {n}-month term"),
        ));
    }
    if let Some(dp) = input.rounding_dp {
        if dp > MAX_ROUNDING_DP {
            return Err(LendingError::invalid(
                "rounding_dp",
                format!("Rounding precision must be at most {MAX_ROUNDING_DP} places"),
            ));
        }
    }

    Ok(())
}

/// Bounds shared by every calculation that starts from a principal and an
/// annual rate.
pub fn validate_principal_and_rate(principal: Money, annual_rate_pct: Percent) -> LendingResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LendingError::invalid("principal", "Loan amount must be positive"));
    }
    if principal > MAX_PRINCIPAL {
        return Err(LendingError::invalid(
            "principal",
            format!("Loan amount must not exceed {MAX_PRINCIPAL}"),
        ));
    }
    validate_rate("annual_rate_pct", annual_rate_pct)
}

pub fn validate_rate(field: &str, annual_rate_pct: Percent) -> LendingResult<()> {
    if annual_rate_pct < Decimal::ZERO {
        return Err(LendingError::invalid(field, "Interest rate cannot be negative"));
    }
    if annual_rate_pct > MAX_ANNUAL_RATE_PCT {
        return Err(LendingError::invalid(
            field,
            format!("Interest rate must not exceed {MAX_ANNUAL_RATE_PCT}%"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

fn round_money(value: Decimal, dp: Option<u32>) -> Decimal {
    match dp {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    }
}

/// Returns `(schedule, periodic_payment, total_interest)`.
fn reducing_balance_schedule(
    input: &LoanInput,
    monthly_rate: Rate,
    n: u32,
) -> LendingResult<(Vec<ScheduleRow>, Money, Money)> {
    let dp = input.rounding_dp;
    let grace = input.grace_period_months;
    let payment = round_money(
        time_value::annuity_payment(input.principal, monthly_rate, n - grace)?,
        dp,
    );
    reject_zero_instalment(payment, dp)?;

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = input.principal;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=n {
        let interest = round_money(balance * monthly_rate, dp);
        let principal = if period <= grace {
            Decimal::ZERO
        } else if period == n {
            // Final instalment settles whatever is left.
            balance
        } else {
            (payment - interest).max(Decimal::ZERO).min(balance)
        };

        balance -= principal;
        total_interest += interest;

        schedule.push(ScheduleRow {
            period,
            payment: principal + interest,
            principal,
            interest,
            balance: balance.max(Decimal::ZERO),
        });
    }

    Ok((schedule, payment, total_interest))
}

fn reject_zero_instalment(payment: Money, dp: Option<u32>) -> LendingResult<()> {
    match dp {
        Some(dp) if payment.is_zero() => Err(LendingError::invalid(
            "rounding_dp",
            format!("Rounding to {dp} decimal place(s) reduces the instalment to zero"),
        )),
        _ => Ok(()),
    }
}

/// Running share `total × k / n`, truncated to `dp` places. Non-decreasing
/// in `k` and never above `total`, so consecutive differences are never
/// negative and the last period picks up the residual.
fn cumulative_share(total: Money, k: u32, n: u32, dp: Option<u32>) -> Money {
    let share = total * Decimal::from(k) / Decimal::from(n);
    match dp {
        Some(dp) => share.round_dp_with_strategy(dp, RoundingStrategy::ToZero),
        None => share,
    }
}

/// Returns `(schedule, periodic_payment, total_interest)`.
fn flat_rate_schedule(
    input: &LoanInput,
    annual_rate: Rate,
    n: u32,
) -> LendingResult<(Vec<ScheduleRow>, Money, Money)> {
    let dp = input.rounding_dp;
    let grace = input.grace_period_months;
    let amortizing = n - grace;
    let n_dec = Decimal::from(n);

    // principal × rate × years, with years = n / 12
    let total_interest = input
        .principal
        .checked_mul(annual_rate)
        .and_then(|v| v.checked_mul(n_dec))
        .map(|v| v / MONTHS_PER_YEAR)
        .ok_or_else(|| {
            LendingError::FinancialImpossibility("Flat-rate interest exceeds the representable range".into())
        })?;

    let periodic_payment = if grace == 0 {
        round_money((input.principal + total_interest) / n_dec, dp)
    } else {
        round_money(
            input.principal / Decimal::from(amortizing) + total_interest / n_dec,
            dp,
        )
    };
    reject_zero_instalment(periodic_payment, dp)?;

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = input.principal;
    let mut interest_to_date = Decimal::ZERO;
    let mut principal_to_date = Decimal::ZERO;

    for period in 1..=n {
        let (principal, interest) = if period == n {
            (balance, total_interest - interest_to_date)
        } else {
            let interest_due = cumulative_share(total_interest, period, n, dp);
            let principal_due = if period <= grace {
                Decimal::ZERO
            } else {
                cumulative_share(input.principal, period - grace, amortizing, dp)
            };
            (
                principal_due - principal_to_date,
                interest_due - interest_to_date,
            )
        };

        balance -= principal;
        principal_to_date += principal;
        interest_to_date += interest;

        schedule.push(ScheduleRow {
            period,
            payment: principal + interest,
            principal,
            interest,
            balance: balance.max(Decimal::ZERO),
        });
    }

    Ok((schedule, periodic_payment, total_interest))
}

// ---------------------------------------------------------------------------
// APR
// ---------------------------------------------------------------------------

/// Nominal APR and effective annual rate from the lender's cash flows:
/// net disbursement out at t=0, instalments in thereafter.
fn effective_rates(
    net_disbursement: Money,
    schedule: &[ScheduleRow],
    monthly_rate: Rate,
) -> LendingResult<(Rate, Rate)> {
    let mut flows = Vec::with_capacity(schedule.len() + 1);
    flows.push(-net_disbursement);
    flows.extend(schedule.iter().map(|r| r.payment));

    let guess = if monthly_rate.is_zero() {
        dec!(0.01)
    } else {
        monthly_rate
    };
    let monthly_irr = time_value::irr(&flows, guess)?;

    let apr = monthly_irr * MONTHS_PER_YEAR;
    let ear = time_value::compound_factor(monthly_irr, 12)? - Decimal::ONE;
    Ok((apr, ear))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn personal_loan() -> LoanInput {
        LoanInput::new(dec!(50000), dec!(15.5), 12)
    }

    fn run(input: &LoanInput) -> LoanCalculatorOutput {
        calculate_loan(input).unwrap().result
    }

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        assert!(
            (actual - expected).abs() <= tol,
            "{msg}: expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn test_reducing_balance_personal_loan() {
        let out = run(&personal_loan());
        assert_eq!(out.schedule.len(), 12);
        assert_eq!(out.number_of_payments, 12);

        // 50,000 at 15.5% over 12 months ≈ 4,524.72 per month
        assert_close(out.periodic_payment, dec!(4524.72), dec!(0.01), "payment");

        let last = out.schedule.last().unwrap();
        assert_eq!(last.balance, Decimal::ZERO);

        let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        assert_close(principal_sum, dec!(50000), dec!(0.000001), "principal sum");
    }

    #[test]
    fn test_reducing_balance_first_period_split() {
        let out = run(&personal_loan());
        let first = &out.schedule[0];
        // 50,000 × 0.155 / 12
        assert_close(first.interest, dec!(645.833333), dec!(0.00001), "interest");
        assert_close(
            first.principal,
            out.periodic_payment - first.interest,
            dec!(0.0000001),
            "principal",
        );
    }

    #[test]
    fn test_zero_rate_reducing_balance() {
        let mut input = LoanInput::new(dec!(12000), Decimal::ZERO, 12);
        input.processing_fee_pct = Decimal::ZERO;
        input.insurance_fee_pct = Decimal::ZERO;
        let out = run(&input);

        assert_eq!(out.periodic_payment, dec!(12000) / Decimal::from(12u32));
        for row in &out.schedule {
            assert_eq!(row.interest, Decimal::ZERO);
            assert_eq!(row.payment, dec!(1000));
        }
        assert_eq!(out.total_interest, Decimal::ZERO);
        assert_close(out.apr.unwrap(), Decimal::ZERO, dec!(0.000001), "apr");
    }

    #[test]
    fn test_flat_rate_total_interest_exact() {
        let mut input = LoanInput::new(dec!(25000), dec!(18), 2);
        input.term_unit = TermUnit::Years;
        input.method = InterestMethod::FlatRate;
        let out = run(&input);

        // 25,000 × 0.18 × 2
        assert_eq!(out.total_interest, dec!(9000));
        assert_eq!(out.total_payment, dec!(34000));
        assert_eq!(out.schedule.len(), 24);
    }

    #[test]
    fn test_flat_rate_constant_payment() {
        let input = LoanInput::new(dec!(12000), dec!(12), 12).with_method(InterestMethod::FlatRate);
        let out = run(&input);

        // interest 1,440 over 12 months: 1,000 principal + 120 interest
        assert_eq!(out.periodic_payment, dec!(1120));
        for row in &out.schedule {
            assert_eq!(row.payment, dec!(1120));
            assert_eq!(row.principal, dec!(1000));
            assert_eq!(row.interest, dec!(120));
        }
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_reducing_cheaper_than_flat() {
        let reducing = run(&personal_loan());
        let flat = run(&personal_loan().with_method(InterestMethod::FlatRate));
        assert!(reducing.total_payment < flat.total_payment);
        assert!(reducing.total_interest < flat.total_interest);
    }

    #[test]
    fn test_fees_reconcile_to_principal() {
        let fees = calculate_fees(dec!(50000), dec!(2), dec!(1)).unwrap();
        assert_eq!(
            fees,
            FeeBreakdown {
                processing_amount: dec!(1000),
                insurance_amount: dec!(500),
                total_fees: dec!(1500),
                net_disbursement: dec!(48500),
            }
        );
        assert_eq!(
            fees.processing_amount + fees.insurance_amount + fees.net_disbursement,
            dec!(50000)
        );
    }

    #[test]
    fn test_oversized_fees_are_errors() {
        let mut input = personal_loan();
        input.processing_fee_pct = Decimal::MAX;
        input.insurance_fee_pct = Decimal::MAX;
        assert!(matches!(
            calculate_loan(&input),
            Err(LendingError::FinancialImpossibility(_))
        ));
        assert!(calculate_fees(Decimal::MAX, Decimal::MAX, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_total_cost_includes_fees() {
        let out = run(&personal_loan());
        assert_eq!(out.total_cost, out.total_payment + out.fees.total_fees);
    }

    #[test]
    fn test_apr_exceeds_nominal_with_fees() {
        let out = run(&personal_loan());
        let apr = out.apr.unwrap();
        // Fees are deducted up front, so the borrower's true rate is above 15.5%.
        assert!(apr > dec!(0.155), "apr {apr}");
        assert!(out.effective_annual_rate.unwrap() > apr);
    }

    #[test]
    fn test_apr_matches_nominal_without_fees() {
        let mut input = personal_loan();
        input.processing_fee_pct = Decimal::ZERO;
        input.insurance_fee_pct = Decimal::ZERO;
        let out = run(&input);
        assert_close(out.apr.unwrap(), dec!(0.155), dec!(0.000001), "apr");
    }

    #[test]
    fn test_term_in_years() {
        let mut input = LoanInput::new(dec!(200000), dec!(12), 2);
        input.term_unit = TermUnit::Years;
        let out = run(&input);
        assert_eq!(out.number_of_payments, 24);
        assert_eq!(out.schedule.len(), 24);
    }

    #[test]
    fn test_grace_period_interest_only() {
        let mut input = LoanInput::new(dec!(12000), dec!(12), 12);
        input.grace_period_months = 3;
        let result = calculate_loan(&input).unwrap();
        let out = &result.result;

        for row in &out.schedule[..3] {
            assert_eq!(row.principal, Decimal::ZERO);
            assert_eq!(row.interest, dec!(120));
            assert_eq!(row.balance, dec!(12000));
        }
        assert!(out.schedule[3].principal > Decimal::ZERO);
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("interest-only")));
    }

    #[test]
    fn test_flat_rate_grace_period() {
        let mut input = LoanInput::new(dec!(12000), dec!(12), 12).with_method(InterestMethod::FlatRate);
        input.grace_period_months = 2;
        let out = run(&input);

        assert_eq!(out.schedule[0].payment, dec!(120));
        assert_eq!(out.schedule[2].principal, dec!(1200));
        assert_eq!(out.total_interest, dec!(1440));
        let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        assert_eq!(principal_sum, dec!(12000));
    }

    #[test]
    fn test_rounding_settles_final_period() {
        let mut input = personal_loan();
        input.rounding_dp = Some(2);
        let out = run(&input);

        assert_eq!(out.periodic_payment, dec!(4524.72));
        for row in &out.schedule {
            assert_eq!(row.interest, row.interest.round_dp(2));
        }
        let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        assert_eq!(principal_sum, dec!(50000));
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    fn assert_rows_non_negative(out: &LoanCalculatorOutput) {
        for row in &out.schedule {
            assert!(row.payment >= Decimal::ZERO, "payment in {row:?}");
            assert!(row.principal >= Decimal::ZERO, "principal in {row:?}");
            assert!(row.interest >= Decimal::ZERO, "interest in {row:?}");
        }
    }

    #[test]
    fn test_flat_rate_rounding_keeps_interest_non_negative() {
        for (principal, rate_pct, months, dp) in [
            (dec!(500), dec!(1), 240u32, 2u32),
            (dec!(100), dec!(10), 12, 0),
            (dec!(25000), dec!(18), 7, 2),
        ] {
            let mut input =
                LoanInput::new(principal, rate_pct, months).with_method(InterestMethod::FlatRate);
            input.rounding_dp = Some(dp);
            let out = run(&input);

            assert_rows_non_negative(&out);
            let interest_sum: Decimal = out.schedule.iter().map(|r| r.interest).sum();
            let principal_sum: Decimal = out.schedule.iter().map(|r| r.principal).sum();
            assert_eq!(interest_sum, out.total_interest, "P={principal} n={months} dp={dp}");
            assert_eq!(principal_sum, principal, "P={principal} n={months} dp={dp}");
            for row in &out.schedule[..out.schedule.len() - 1] {
                assert_eq!(row.interest, row.interest.round_dp(dp));
                assert_eq!(row.principal, row.principal.round_dp(dp));
            }
        }
    }

    #[test]
    fn test_flat_rate_rounding_with_grace() {
        let mut input = LoanInput::new(dec!(1000), dec!(7), 7).with_method(InterestMethod::FlatRate);
        input.grace_period_months = 2;
        input.rounding_dp = Some(2);
        let out = run(&input);

        assert_rows_non_negative(&out);
        assert_eq!(out.schedule[0].principal, Decimal::ZERO);
        assert_eq!(out.schedule[1].principal, Decimal::ZERO);
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_to_zero_instalment_rejected() {
        for method in [InterestMethod::ReducingBalance, InterestMethod::FlatRate] {
            let mut input = LoanInput::new(dec!(1), dec!(10), 12).with_method(method);
            input.rounding_dp = Some(0);
            assert!(matches!(
                calculate_loan(&input),
                Err(LendingError::InvalidInput { ref field, .. }) if field == "rounding_dp"
            ));
        }
    }

    #[test]
    fn test_high_rate_century_term_is_computed() {
        let mut input = LoanInput::new(dec!(50000), dec!(200), 100);
        input.term_unit = TermUnit::Years;
        for method in [InterestMethod::ReducingBalance, InterestMethod::FlatRate] {
            let out = run(&input.clone().with_method(method));
            assert_eq!(out.schedule.len(), 1200);
            assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
            assert_rows_non_negative(&out);
        }
    }

    #[test]
    fn test_large_principal_long_term_is_computed() {
        let out = run(&LoanInput::new(dec!(1000000), dec!(60), 1200));
        // (1.05)^1200 dwarfs 1, so the instalment is essentially interest-only
        assert_close(out.periodic_payment, dec!(50000), dec!(0.01), "payment");
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
        assert_rows_non_negative(&out);
    }

    #[test]
    fn test_validation_rejects_out_of_range_amounts() {
        let mut input = personal_loan();
        input.annual_rate_pct = MAX_ANNUAL_RATE_PCT + Decimal::ONE;
        assert!(calculate_loan(&input).is_err());

        let mut input = personal_loan();
        input.principal = MAX_PRINCIPAL + Decimal::ONE;
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_validation_rejects_non_positive_principal() {
        let mut input = personal_loan();
        input.principal = Decimal::ZERO;
        assert!(calculate_loan(&input).is_err());
        input.principal = dec!(-1);
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_term() {
        let mut input = personal_loan();
        input.term = 0;
        assert!(matches!(
            calculate_loan(&input),
            Err(LendingError::InvalidInput { ref field, .. }) if field == "term"
        ));
    }

    #[test]
    fn test_validation_rejects_negative_rate() {
        let mut input = personal_loan();
        input.annual_rate_pct = dec!(-0.5);
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_validation_rejects_excessive_fees() {
        let mut input = personal_loan();
        input.processing_fee_pct = dec!(60);
        input.insurance_fee_pct = dec!(40);
        assert!(matches!(
            calculate_loan(&input),
            Err(LendingError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_validation_rejects_long_grace() {
        let mut input = personal_loan();
        input.grace_period_months = 12;
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_validation_rejects_overlong_term() {
        let mut input = personal_loan();
        input.term = 101;
        input.term_unit = TermUnit::Years;
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_high_rate_warning() {
        let mut input = personal_loan();
        input.annual_rate_pct = dec!(150);
        let result = calculate_loan(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("unusually high")));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let input: LoanInput = serde_json::from_str(
            r#"{"principal": "50000", "annual_rate_pct": "15.5", "term": 12, "method": "flat"}"#,
        )
        .unwrap();
        assert_eq!(input.method, InterestMethod::FlatRate);
        assert_eq!(input.term_unit, TermUnit::Months);
        assert_eq!(input.processing_fee_pct, dec!(2));
        assert_eq!(input.insurance_fee_pct, dec!(1));
        assert_eq!(input.grace_period_months, 0);
    }

    #[test]
    fn test_metadata_populated() {
        let result = calculate_loan(&personal_loan()).unwrap();
        assert!(result.methodology.contains("Reducing-balance"));
        assert_eq!(result.assumptions["term"], 12);
    }
}
