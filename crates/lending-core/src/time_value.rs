use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LendingError;
use crate::types::{Money, Rate};
use crate::LendingResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// `(1 + rate)^n` by repeated multiplication. Integer periods only, so no
/// `powd` rounding creeps into the annuity factor.
///
/// Fails with `FinancialImpossibility` when the factor leaves the range of
/// `Decimal`.
pub fn compound_factor(rate: Rate, n: u32) -> LendingResult<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..n {
        factor = factor.checked_mul(one_plus_r).ok_or_else(|| {
            LendingError::FinancialImpossibility(format!(
                "(1 + {rate})^{n} exceeds the representable range"
            ))
        })?;
    }
    Ok(factor)
}

/// NPV and its first derivative at `rate`. Once the discount factor grows
/// past the range of `Decimal` the remaining terms are below its precision
/// and are dropped. `None` when a term cannot be evaluated at all.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                None => break,
            }
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            if let Some(next) = discount.checked_mul(one_plus_r) {
                let term = Decimal::from(t as u64).checked_mul(*cf)?.checked_div(next)?;
                dnpv = dnpv.checked_sub(term)?;
            }
        }
    }

    Some((npv_val, dnpv))
}

/// Net Present Value of a series of periodic cash flows (first flow at t=0).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> LendingResult<Money> {
    if rate <= dec!(-1) {
        return Err(LendingError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_with_derivative(rate, cash_flows)
        .map(|(value, _)| value)
        .ok_or_else(|| LendingError::DivisionByZero {
            context: format!("NPV discount factor at rate {rate}"),
        })
}

/// Internal Rate of Return per period using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> LendingResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(LendingError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_with_derivative(rate, cash_flows).ok_or_else(|| {
            LendingError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: Decimal::MAX,
            }
        })?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        let step = match npv_val.checked_div(dnpv) {
            Some(step) if !dnpv.is_zero() => step,
            _ => {
                return Err(LendingError::ConvergenceFailure {
                    function: "IRR".into(),
                    iterations: i,
                    last_delta: npv_val,
                })
            }
        };
        rate = rate.checked_sub(step).unwrap_or(dec!(100.0));

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(LendingError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// yields a negative payment.
///
/// Evaluated as `(pv + fv/(1+r)^n) · r · (1+r)^n / ((1+r)^n − 1)` so that
/// `pv` is never multiplied by the compound factor. For a positive rate whose
/// factor overflows, `(1+r)^n / ((1+r)^n − 1)` is 1 to full precision.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> LendingResult<Money> {
    if nper == 0 {
        return Err(LendingError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let (discounted_fv, ratio) = match compound_factor(rate, nper) {
        Ok(factor) => {
            let growth = factor - Decimal::ONE;
            if growth.is_zero() {
                return Err(LendingError::DivisionByZero {
                    context: "PMT annuity factor".into(),
                });
            }
            let ratio = factor.checked_div(growth).ok_or_else(|| LendingError::DivisionByZero {
                context: "PMT annuity factor".into(),
            })?;
            let discounted_fv = future_value.checked_div(factor).ok_or_else(|| {
                LendingError::DivisionByZero {
                    context: "PMT compound factor".into(),
                }
            })?;
            (discounted_fv, ratio)
        }
        Err(_) if rate > Decimal::ZERO => (Decimal::ZERO, Decimal::ONE),
        Err(e) => return Err(e),
    };

    (present_value + discounted_fv)
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(ratio))
        .map(|v| -v)
        .ok_or_else(|| {
            LendingError::FinancialImpossibility(format!(
                "Payment on {present_value} at {rate} per period exceeds the representable range"
            ))
        })
}

/// Level instalment that fully repays `principal` over `nper` periods at the
/// periodic `rate`: `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n` when `rate` is 0.
pub fn annuity_payment(principal: Money, rate: Rate, nper: u32) -> LendingResult<Money> {
    Ok(-pmt(rate, nper, principal, Decimal::ZERO)?)
}
