//! In-memory collaborators
//!
//! Balance-tracking implementations of [`AssetTransfer`] and [`BonusCredit`]
//! used by the test suite and the scenario runner.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tenure_common::{AccountId, Amount, TransferError};
use tracing::debug;

use super::{AssetTransfer, BonusCredit};

/// Asset balances of depositors plus the pool's own reserve
///
/// Principal pulled in lands in the reserve; payouts come out of it, so the
/// reserve must be funded for rewards on top of principal.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    balances: DashMap<AccountId, Amount>,
    reserve: Mutex<Amount>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `account` spendable funds
    pub fn deposit(&self, account: &AccountId, amount: Amount) {
        let mut balance = self.balances.entry(account.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Add funds to the pool reserve
    pub fn fund_reserve(&self, amount: Amount) {
        let mut reserve = self.reserve.lock();
        *reserve = reserve.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }

    pub fn reserve(&self) -> Amount {
        *self.reserve.lock()
    }
}

#[async_trait]
impl AssetTransfer for InMemoryVault {
    async fn pull_in(&self, depositor: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut balance = self.balances.entry(depositor.clone()).or_default();
        if *balance < amount {
            return Err(TransferError::InsufficientFundsOrApproval {
                account: depositor.clone(),
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        let mut reserve = self.reserve.lock();
        *reserve = reserve.saturating_add(amount);
        debug!(%depositor, amount, "Pulled into reserve");
        Ok(())
    }

    async fn push_out(&self, depositor: &AccountId, amount: Amount) -> Result<(), TransferError> {
        {
            let mut reserve = self.reserve.lock();
            if *reserve < amount {
                return Err(TransferError::ReserveExhausted {
                    required: amount,
                    available: *reserve,
                });
            }
            *reserve -= amount;
        }
        self.deposit(depositor, amount);
        debug!(%depositor, amount, "Paid out of reserve");
        Ok(())
    }
}

/// Accumulated bonus credits per account, with the individual credits kept
/// for inspection
#[derive(Debug, Default)]
pub struct InMemoryBonusLedger {
    credited: DashMap<AccountId, Amount>,
    history: Mutex<Vec<(AccountId, Amount)>>,
}

impl InMemoryBonusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credited(&self, account: &AccountId) -> Amount {
        self.credited.get(account).map(|c| *c).unwrap_or(0)
    }

    /// Every credit call in order
    pub fn history(&self) -> Vec<(AccountId, Amount)> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl BonusCredit for InMemoryBonusLedger {
    async fn credit_bonus(&self, depositor: &AccountId, amount: Amount) {
        {
            let mut credited = self.credited.entry(depositor.clone()).or_default();
            *credited = credited.saturating_add(amount);
        }
        self.history.lock().push((depositor.clone(), amount));
    }
}
