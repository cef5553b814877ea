//! Round - one fixed-term deposit
//!
//! A round locks `amount_lent` for `tenure_seconds` starting at
//! `start_timestamp`. Everything except `settled` is fixed at creation, and
//! `settled` only ever goes from `false` to `true`.

use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::amount::{Amount, BasisPoints, Timestamp};

/// Seconds in one day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// A single fixed-term deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Owner and beneficiary of the round
    pub depositor: AccountId,

    /// Principal in smallest units
    pub amount_lent: Amount,

    /// Annualized bonus rate chosen at creation
    pub bonus_rate_bps: BasisPoints,

    /// Lock duration
    pub tenure_seconds: u64,

    /// Bonus flag recorded at creation.
    ///
    /// Stored and surfaced only; reward computation and the bonus credit do
    /// not depend on it.
    pub bonus_flag: bool,

    /// Creation time (Unix seconds)
    pub start_timestamp: Timestamp,

    /// Set once by a successful withdrawal
    pub settled: bool,
}

impl Round {
    /// Tenure converted from whole days, `None` on overflow
    pub fn tenure_from_days(days: u32) -> Option<u64> {
        u64::from(days).checked_mul(SECONDS_PER_DAY)
    }

    /// Time at which the round becomes withdrawable
    pub fn maturity(&self) -> Timestamp {
        self.start_timestamp.saturating_add(self.tenure_seconds)
    }

    /// Whether the round still counts toward the depositor's lent balance
    #[inline]
    pub fn is_outstanding(&self) -> bool {
        !self.settled
    }
}

/// Amounts released by settling a single round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub principal: Amount,
    pub stable_reward: Amount,
    pub bonus_reward: Amount,
}

impl Payout {
    /// Principal plus stable reward, paid in the base asset
    pub fn base_asset_amount(&self) -> Option<Amount> {
        self.principal.checked_add(self.stable_reward)
    }
}

/// Totals released by a batch settlement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPayout {
    pub principal: Amount,
    pub stable_reward: Amount,
    pub bonus_reward: Amount,
    /// Indices settled by this batch, ascending
    pub settled_indices: Vec<usize>,
}

impl BatchPayout {
    /// True when the batch found nothing to settle
    pub fn is_empty(&self) -> bool {
        self.settled_indices.is_empty()
    }

    /// Principal plus stable reward, paid in the base asset
    pub fn base_asset_amount(&self) -> Option<Amount> {
        self.principal.checked_add(self.stable_reward)
    }
}
