//! Side-by-side loan comparisons: the same principal across several terms,
//! across several interest rates, and under both interest methods.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{
    calculate_loan, validate_principal_and_rate, validate_rate, InterestMethod, LoanInput,
    MAX_PAYMENTS,
};
use crate::error::LendingError;
use crate::time_value;
use crate::types::*;
use crate::LendingResult;

/// Terms (in months) offered when the caller does not list any.
pub const DEFAULT_COMPARISON_TERMS: [u32; 4] = [6, 12, 18, 24];

/// Annual rates (percent) offered when the caller does not list any.
pub const DEFAULT_COMPARISON_RATES: [Decimal; 5] =
    [dec!(10), dec!(12.5), dec!(15), dec!(17.5), dec!(20)];

// ---------------------------------------------------------------------------
// Term comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermComparisonInput {
    pub principal: Money,
    pub annual_rate_pct: Percent,
    /// Terms in months; empty means [`DEFAULT_COMPARISON_TERMS`].
    #[serde(default)]
    pub terms: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermOption {
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermComparisonOutput {
    pub options: Vec<TermOption>,
}

/// Reducing-balance instalment and total repaid for each candidate term.
pub fn compare_terms(
    input: &TermComparisonInput,
) -> LendingResult<ComputationOutput<TermComparisonOutput>> {
    let start = Instant::now();
    validate_principal_and_rate(input.principal, input.annual_rate_pct)?;

    let terms: Vec<u32> = if input.terms.is_empty() {
        DEFAULT_COMPARISON_TERMS.to_vec()
    } else {
        input.terms.clone()
    };

    let monthly_rate = pct_to_rate(input.annual_rate_pct) / dec!(12);
    let mut options = Vec::with_capacity(terms.len());
    for term in terms {
        if term == 0 || term > MAX_PAYMENTS {
            return Err(LendingError::invalid(
                "terms",
                format!("Every term must be between 1 and {MAX_PAYMENTS} months"),
            ));
        }
        let monthly_payment = time_value::annuity_payment(input.principal, monthly_rate, term)?;
        let total_payment = monthly_payment * Decimal::from(term);
        options.push(TermOption {
            term_months: term,
            monthly_payment,
            total_payment,
            total_interest: total_payment - input.principal,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Term comparison (reducing balance)",
        input,
        Vec::new(),
        elapsed,
        TermComparisonOutput { options },
    ))
}

// ---------------------------------------------------------------------------
// Rate impact
// ---------------------------------------------------------------------------

/// Position of a candidate rate relative to the quoted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePosition {
    Current,
    Higher,
    Lower,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateImpactInput {
    pub principal: Money,
    pub term_months: u32,
    /// The rate actually quoted to the client.
    pub current_rate_pct: Percent,
    /// Candidate rates; empty means [`DEFAULT_COMPARISON_RATES`].
    #[serde(default)]
    pub rates: Vec<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateOption {
    pub annual_rate_pct: Percent,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub position: RatePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateImpactOutput {
    pub options: Vec<RateOption>,
}

/// Reducing-balance instalment at each candidate rate, tagged relative to
/// the current quote.
pub fn rate_impact(input: &RateImpactInput) -> LendingResult<ComputationOutput<RateImpactOutput>> {
    let start = Instant::now();
    validate_principal_and_rate(input.principal, input.current_rate_pct)?;
    if input.term_months == 0 || input.term_months > MAX_PAYMENTS {
        return Err(LendingError::invalid(
            "term_months",
            format!("Term must be between 1 and {MAX_PAYMENTS} months"),
        ));
    }

    let rates: Vec<Percent> = if input.rates.is_empty() {
        DEFAULT_COMPARISON_RATES.to_vec()
    } else {
        input.rates.clone()
    };

    let mut options = Vec::with_capacity(rates.len());
    for rate_pct in rates {
        validate_rate("rates", rate_pct)?;
        let monthly_rate = pct_to_rate(rate_pct) / dec!(12);
        let monthly_payment =
            time_value::annuity_payment(input.principal, monthly_rate, input.term_months)?;
        let position = match rate_pct.cmp(&input.current_rate_pct) {
            std::cmp::Ordering::Equal => RatePosition::Current,
            std::cmp::Ordering::Greater => RatePosition::Higher,
            std::cmp::Ordering::Less => RatePosition::Lower,
        };
        options.push(RateOption {
            annual_rate_pct: rate_pct,
            monthly_payment,
            total_payment: monthly_payment * Decimal::from(input.term_months),
            position,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rate impact (reducing balance)",
        input,
        Vec::new(),
        elapsed,
        RateImpactOutput { options },
    ))
}

// ---------------------------------------------------------------------------
// Method comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: InterestMethod,
    pub periodic_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodComparisonOutput {
    pub reducing_balance: MethodSummary,
    pub flat_rate: MethodSummary,
    /// Flat-rate total minus reducing-balance total.
    pub total_payment_difference: Money,
    pub cheaper_method: InterestMethod,
}

/// Run the same loan under both interest methods.
pub fn compare_methods(
    input: &LoanInput,
) -> LendingResult<ComputationOutput<MethodComparisonOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let reducing = calculate_loan(&input.clone().with_method(InterestMethod::ReducingBalance))?;
    let flat = calculate_loan(&input.clone().with_method(InterestMethod::FlatRate))?;
    warnings.extend(reducing.warnings.iter().cloned());

    let summarize = |method: InterestMethod, out: &super::calculator::LoanCalculatorOutput| {
        MethodSummary {
            method,
            periodic_payment: out.periodic_payment,
            total_payment: out.total_payment,
            total_interest: out.total_interest,
        }
    };
    let reducing_balance = summarize(InterestMethod::ReducingBalance, &reducing.result);
    let flat_rate = summarize(InterestMethod::FlatRate, &flat.result);

    let total_payment_difference = flat_rate.total_payment - reducing_balance.total_payment;
    if total_payment_difference < Decimal::ZERO {
        warnings.push("Flat rate is cheaper than reducing balance for this loan".into());
    }
    let cheaper_method = if total_payment_difference < Decimal::ZERO {
        InterestMethod::FlatRate
    } else {
        InterestMethod::ReducingBalance
    };

    let output = MethodComparisonOutput {
        reducing_balance,
        flat_rate,
        total_payment_difference,
        cheaper_method,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Interest method comparison",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_terms() {
        let input = TermComparisonInput {
            principal: dec!(50000),
            annual_rate_pct: dec!(15.5),
            terms: vec![],
        };
        let out = compare_terms(&input).unwrap().result;
        let terms: Vec<u32> = out.options.iter().map(|o| o.term_months).collect();
        assert_eq!(terms, vec![6, 12, 18, 24]);
    }

    #[test]
    fn test_longer_term_lower_payment_more_interest() {
        let input = TermComparisonInput {
            principal: dec!(50000),
            annual_rate_pct: dec!(15.5),
            terms: vec![6, 24],
        };
        let out = compare_terms(&input).unwrap().result;
        assert!(out.options[1].monthly_payment < out.options[0].monthly_payment);
        assert!(out.options[1].total_interest > out.options[0].total_interest);
    }

    #[test]
    fn test_zero_term_rejected() {
        let input = TermComparisonInput {
            principal: dec!(50000),
            annual_rate_pct: dec!(15.5),
            terms: vec![12, 0],
        };
        assert!(compare_terms(&input).is_err());
    }

    #[test]
    fn test_term_beyond_payment_cap_rejected() {
        let input = TermComparisonInput {
            principal: dec!(50000),
            annual_rate_pct: dec!(15.5),
            terms: vec![MAX_PAYMENTS + 1],
        };
        assert!(compare_terms(&input).is_err());
    }

    #[test]
    fn test_rate_positions() {
        let input = RateImpactInput {
            principal: dec!(50000),
            term_months: 12,
            current_rate_pct: dec!(15),
            rates: vec![],
        };
        let out = rate_impact(&input).unwrap().result;
        let positions: Vec<RatePosition> = out.options.iter().map(|o| o.position).collect();
        assert_eq!(
            positions,
            vec![
                RatePosition::Lower,
                RatePosition::Lower,
                RatePosition::Current,
                RatePosition::Higher,
                RatePosition::Higher,
            ]
        );
        // Payments rise with the rate.
        for pair in out.options.windows(2) {
            assert!(pair[1].monthly_payment > pair[0].monthly_payment);
        }
    }

    #[test]
    fn test_rate_impact_zero_rate_candidate() {
        let input = RateImpactInput {
            principal: dec!(1200),
            term_months: 12,
            current_rate_pct: dec!(10),
            rates: vec![Decimal::ZERO],
        };
        let out = rate_impact(&input).unwrap().result;
        assert_eq!(out.options[0].monthly_payment, dec!(100));
        assert_eq!(out.options[0].position, RatePosition::Lower);
    }

    #[test]
    fn test_method_comparison_reducing_cheaper() {
        let input = LoanInput::new(dec!(50000), dec!(15.5), 12);
        let out = compare_methods(&input).unwrap().result;
        assert!(out.total_payment_difference > Decimal::ZERO);
        assert_eq!(out.cheaper_method, InterestMethod::ReducingBalance);
        assert_eq!(out.flat_rate.total_interest, dec!(7750));
    }

    #[test]
    fn test_method_comparison_zero_rate_identical() {
        let input = LoanInput::new(dec!(12000), Decimal::ZERO, 12);
        let out = compare_methods(&input).unwrap().result;
        assert_eq!(out.total_payment_difference, Decimal::ZERO);
    }
}
