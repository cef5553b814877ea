//! Pool-wide configuration

use serde::{Deserialize, Serialize};

use super::amount::{Amount, AssetUnit, BasisPoints};

/// Pool configuration owned by a ledger instance
///
/// `stable_rate_bps` is fixed when the pool is created. `minimum_deposit` can
/// be changed by the administrator; a change only applies to rounds created
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Annualized stable rate applied to every round
    pub stable_rate_bps: BasisPoints,
    /// Minimum principal for a new round
    pub minimum_deposit: Amount,
    /// Denomination of principal and rewards
    pub asset: AssetUnit,
}

impl PoolConfig {
    pub fn new(stable_rate_bps: BasisPoints, asset: AssetUnit) -> Self {
        Self {
            stable_rate_bps,
            minimum_deposit: 0,
            asset,
        }
    }

    pub fn with_minimum_deposit(mut self, minimum_deposit: Amount) -> Self {
        self.minimum_deposit = minimum_deposit;
        self
    }
}
