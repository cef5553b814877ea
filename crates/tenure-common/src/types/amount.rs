//! Amount, time and rate primitives
//!
//! All principal and reward values are integers in the asset's smallest unit
//! (e.g. 1 USDC = 1_000_000 with 6 decimals). Decimal rendering is only used at
//! the edges, for display and for parsing human input.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Asset amount in smallest units
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Rate in basis points (10_000 = 100%)
pub type BasisPoints = u32;

/// Largest scale a `Decimal` can carry
pub const MAX_DECIMALS: u32 = 28;

/// Denomination of the pooled asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUnit {
    /// Ticker, informational only
    pub symbol: String,
    /// Number of decimals of the smallest unit
    pub decimals: u32,
}

impl Default for AssetUnit {
    fn default() -> Self {
        Self {
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }
}

impl AssetUnit {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Render a smallest-unit amount as a decimal in whole asset units.
    ///
    /// Returns `None` if the amount does not fit a `Decimal` at this scale.
    pub fn to_decimal(&self, amount: Amount) -> Option<Decimal> {
        if self.decimals > MAX_DECIMALS {
            return None;
        }
        let mantissa = i128::try_from(amount).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, self.decimals)
            .ok()
            .map(|d| d.normalize())
    }

    /// Convert a decimal in whole asset units to smallest units.
    ///
    /// Digits beyond the asset's precision are truncated. Negative values and
    /// values that overflow `Amount` yield `None`.
    pub fn to_units(&self, value: Decimal) -> Option<Amount> {
        if value.is_sign_negative() || self.decimals > MAX_DECIMALS {
            return None;
        }
        let truncated = value.round_dp_with_strategy(self.decimals, RoundingStrategy::ToZero);
        let shift = self.decimals - truncated.scale();
        let factor = 10i128.checked_pow(shift)?;
        let units = truncated.mantissa().checked_mul(factor)?;
        Amount::try_from(units).ok()
    }

    /// Human-readable `"<amount> <symbol>"`, falling back to raw units
    pub fn format(&self, amount: Amount) -> String {
        match self.to_decimal(amount) {
            Some(d) => format!("{} {}", d, self.symbol),
            None => format!("{} units", amount),
        }
    }
}
