//! Display conversion between the local loan currency and USD.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::types::{Currency, Money};
use crate::LendingResult;

/// Indicative ZWL per USD used when no rate is configured.
pub const DEFAULT_ZWL_PER_USD: Decimal = dec!(38500);

/// An amount tagged with its currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub amount: Money,
    pub currency: Currency,
}

/// Convert a local-currency amount to USD at `local_per_usd`.
pub fn to_usd(amount: Money, local_per_usd: Decimal) -> LendingResult<Money> {
    if local_per_usd <= Decimal::ZERO {
        return Err(LendingError::invalid(
            "local_per_usd",
            "Exchange rate must be positive",
        ));
    }
    Ok(amount / local_per_usd)
}

/// Convert a tagged amount into USD. USD amounts pass through unchanged.
pub fn convert_to_usd(value: &CurrencyAmount, local_per_usd: Decimal) -> LendingResult<CurrencyAmount> {
    let amount = match value.currency {
        Currency::USD => value.amount,
        _ => to_usd(value.amount, local_per_usd)?,
    };
    Ok(CurrencyAmount {
        amount,
        currency: Currency::USD,
    })
}
