//! Capability interfaces the ledger depends on
//!
//! The engine never moves funds, reads a clock or decides who may act by
//! itself. It is handed these collaborators at construction:
//!
//! - [`AssetTransfer`]: pull principal in at creation, push principal and
//!   stable reward out at settlement
//! - [`BonusCredit`]: credit the bonus reward through a separate channel
//! - [`Authorizer`]: depositor/delegate and administrator checks
//! - [`Clock`]: current time for outer layers; the engine itself always
//!   takes `now` as an argument

pub mod auth;
pub mod clock;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tenure_common::{AccountId, Amount, Timestamp, TransferError};

pub use auth::DelegationAuthorizer;
pub use clock::{ManualClock, SystemClock};
pub use memory::{InMemoryBonusLedger, InMemoryVault};

/// Moves the pooled asset between depositors and the pool
#[async_trait]
pub trait AssetTransfer: Send + Sync {
    /// Take `amount` from `depositor` into the pool.
    ///
    /// Fails with `InsufficientFundsOrApproval` when the depositor cannot
    /// supply it.
    async fn pull_in(&self, depositor: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Pay `amount` from the pool to `depositor`
    async fn push_out(&self, depositor: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

/// Credits bonus rewards
///
/// Invoked after the settlement has been committed, so it cannot fail; an
/// implementation backed by a fallible system must queue and retry on its own.
#[async_trait]
pub trait BonusCredit: Send + Sync {
    async fn credit_bonus(&self, depositor: &AccountId, amount: Amount);
}

/// Authorization gate evaluated before any mutation
pub trait Authorizer: Send + Sync {
    /// Caller is the depositor or acts on the depositor's behalf
    fn authorize_depositor(&self, caller: &AccountId, depositor: &AccountId) -> bool;

    /// Caller administers the pool configuration
    fn is_admin(&self, caller: &AccountId) -> bool;
}

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The collaborator set a coordinator is built from
#[derive(Clone)]
pub struct Collaborators {
    pub assets: Arc<dyn AssetTransfer>,
    pub bonus: Arc<dyn BonusCredit>,
    pub auth: Arc<dyn Authorizer>,
}

impl Collaborators {
    pub fn new(
        assets: Arc<dyn AssetTransfer>,
        bonus: Arc<dyn BonusCredit>,
        auth: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            assets,
            bonus,
            auth,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
