//! Settlement coordinator
//!
//! Entry point for every depositor and administrator action. It owns the pool
//! configuration and the round ledger and drives the external collaborators:
//!
//! ```text
//! create:   authorize -> copy config -> validate -> pull_in -> append
//! withdraw: authorize -> validate -> accrue -> push_out -> mark settled -> credit bonus
//! batch:    authorize -> finished set -> accumulate -> one push_out -> mark all -> one credit
//! ```
//!
//! The depositor's book stays write-locked from validation until commit, so
//! the asset transfer and the ledger update form one boundary: a failed
//! transfer leaves every round untouched, and no reader can observe a
//! half-settled batch.

use std::sync::Arc;

use parking_lot::RwLock;
use tenure_common::{
    AccountId, Amount, BasisPoints, BatchPayout, Payout, PoolConfig, Result, Round, RoundError,
    TenureError, Timestamp,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::accrual::{AccrualEngine, RewardBreakdown};
use crate::collaborators::{AssetTransfer, Authorizer, BonusCredit, Collaborators};
use crate::events::{EventBus, LedgerEvent};
use crate::ledger::RoundLedger;

/// Fixed-term deposit pool: ledger, configuration and collaborators
pub struct SettlementCoordinator {
    config: RwLock<PoolConfig>,
    ledger: RoundLedger,
    assets: Arc<dyn AssetTransfer>,
    bonus: Arc<dyn BonusCredit>,
    auth: Arc<dyn Authorizer>,
    events: EventBus,
}

/// The coordinator is the pool as seen from outside
pub type LenderPool = SettlementCoordinator;

impl SettlementCoordinator {
    pub fn new(config: PoolConfig, collaborators: Collaborators) -> Self {
        Self::with_event_bus(config, collaborators, EventBus::default())
    }

    pub fn with_event_bus(config: PoolConfig, collaborators: Collaborators, events: EventBus) -> Self {
        info!(
            stable_rate_bps = config.stable_rate_bps,
            minimum_deposit = %config.asset.format(config.minimum_deposit),
            "Lender pool created"
        );
        Self {
            config: RwLock::new(config),
            ledger: RoundLedger::new(),
            assets: collaborators.assets,
            bonus: collaborators.bonus,
            auth: collaborators.auth,
            events,
        }
    }

    // ── Administration ─────────────────────────────────────────────────────

    /// Copy of the current pool configuration
    pub fn pool_config(&self) -> PoolConfig {
        self.config.read().clone()
    }

    /// Change the minimum deposit for rounds created from now on
    #[instrument(skip(self))]
    pub fn set_minimum_deposit(&self, caller: &AccountId, minimum_deposit: Amount) -> Result<()> {
        if !self.auth.is_admin(caller) {
            warn!(%caller, "Rejected minimum deposit change");
            return Err(TenureError::unauthorized(caller, "set the minimum deposit"));
        }

        let previous = {
            let mut config = self.config.write();
            std::mem::replace(&mut config.minimum_deposit, minimum_deposit)
        };
        info!(previous, current = minimum_deposit, "Minimum deposit changed");
        self.events.publish(LedgerEvent::MinimumDepositChanged {
            previous,
            current: minimum_deposit,
        });
        Ok(())
    }

    // ── Round lifecycle ────────────────────────────────────────────────────

    /// Open a round for `depositor`, pulling `amount` from them.
    ///
    /// `caller` may be the depositor or an approved delegate; the round always
    /// belongs to `depositor`. Returns the new round's index.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self))]
    pub async fn create_round(
        &self,
        caller: &AccountId,
        depositor: &AccountId,
        amount: Amount,
        bonus_rate_bps: BasisPoints,
        tenure_days: u32,
        bonus_flag: bool,
        now: Timestamp,
    ) -> Result<usize> {
        self.require_depositor(caller, depositor, "create rounds")?;
        let minimum_deposit = self.config.read().minimum_deposit;

        let round = crate::ledger::DepositorRounds::prepare_round(
            depositor.clone(),
            amount,
            bonus_rate_bps,
            tenure_days,
            bonus_flag,
            now,
            minimum_deposit,
        )
        .map_err(|e| {
            warn!(%depositor, amount, error = %e, "Round rejected");
            e
        })?;

        // Rejected requests must not leave a book behind
        let book = self.ledger.book(depositor);
        let mut rounds = book.write().await;

        if let Err(err) = self.assets.pull_in(depositor, amount).await {
            drop(rounds);
            drop(book);
            self.ledger.discard_if_empty(depositor);
            return Err(err.into());
        }

        let tenure_seconds = round.tenure_seconds;
        let index = rounds.append(round);
        drop(rounds);

        info!(%depositor, index, amount, tenure_days, "Round created");
        self.events.publish(LedgerEvent::RoundCreated {
            depositor: depositor.clone(),
            created_by: caller.clone(),
            index,
            amount,
            bonus_rate_bps,
            tenure_seconds,
            bonus_flag,
            start_timestamp: now,
        });
        Ok(index)
    }

    /// Settle one finished round, paying principal plus stable reward in the
    /// base asset and the bonus reward as a bonus credit.
    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        caller: &AccountId,
        depositor: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<Payout> {
        self.require_depositor(caller, depositor, "withdraw")?;
        let stable_rate_bps = self.config.read().stable_rate_bps;

        let book = self
            .ledger
            .existing(depositor)
            .ok_or(RoundError::IndexOutOfRange { index, count: 0 })?;
        let mut rounds = book.write().await;

        let round = rounds.get(index)?;
        if round.settled {
            return Err(RoundError::AlreadySettled { index }.into());
        }
        if !AccrualEngine::is_finished(round, now) {
            let remaining_secs = AccrualEngine::time_remaining(round, now);
            debug!(%depositor, index, remaining_secs, "Withdrawal before maturity");
            return Err(RoundError::RoundNotFinished {
                index,
                remaining_secs,
            }
            .into());
        }

        let rewards = AccrualEngine::rewards(round, stable_rate_bps, now)?;
        let payout = Payout {
            principal: round.amount_lent,
            stable_reward: rewards.stable,
            bonus_reward: rewards.bonus,
        };
        let base_amount = payout.base_asset_amount().ok_or(TenureError::Overflow)?;

        self.assets.push_out(depositor, base_amount).await?;
        rounds.mark_settled(index)?;
        self.bonus.credit_bonus(depositor, payout.bonus_reward).await;
        drop(rounds);

        info!(
            %depositor,
            index,
            principal = payout.principal,
            stable = payout.stable_reward,
            bonus = payout.bonus_reward,
            "Round settled"
        );
        self.events.publish(LedgerEvent::RoundSettled {
            depositor: depositor.clone(),
            index,
            payout,
        });
        Ok(payout)
    }

    /// Settle every finished round of `depositor` with one net transfer and
    /// one net bonus credit.
    ///
    /// Nothing to settle is a success with zero totals and no indices.
    #[instrument(skip(self))]
    pub async fn withdraw_all_finished(
        &self,
        caller: &AccountId,
        depositor: &AccountId,
        now: Timestamp,
    ) -> Result<BatchPayout> {
        self.require_depositor(caller, depositor, "withdraw")?;
        let stable_rate_bps = self.config.read().stable_rate_bps;

        let Some(book) = self.ledger.existing(depositor) else {
            return Ok(BatchPayout::default());
        };
        let mut rounds = book.write().await;

        let indices = rounds.finished(now);
        if indices.is_empty() {
            debug!(%depositor, "No finished rounds");
            return Ok(BatchPayout::default());
        }

        // Accumulate without touching the book
        let mut batch = BatchPayout::default();
        let mut payouts = Vec::with_capacity(indices.len());
        for &index in &indices {
            let round = rounds.get(index)?;
            let rewards = AccrualEngine::rewards(round, stable_rate_bps, now)?;
            let payout = Payout {
                principal: round.amount_lent,
                stable_reward: rewards.stable,
                bonus_reward: rewards.bonus,
            };
            batch.principal = checked_add(batch.principal, payout.principal)?;
            batch.stable_reward = checked_add(batch.stable_reward, payout.stable_reward)?;
            batch.bonus_reward = checked_add(batch.bonus_reward, payout.bonus_reward)?;
            payouts.push((index, payout));
        }
        let base_amount = batch.base_asset_amount().ok_or(TenureError::Overflow)?;

        self.assets.push_out(depositor, base_amount).await?;
        // Every index came from `finished`, so these cannot fail
        for &index in &indices {
            rounds.mark_settled(index)?;
        }
        self.bonus.credit_bonus(depositor, batch.bonus_reward).await;
        drop(rounds);

        batch.settled_indices = indices;
        info!(
            %depositor,
            rounds = batch.settled_indices.len(),
            principal = batch.principal,
            stable = batch.stable_reward,
            bonus = batch.bonus_reward,
            "Finished rounds settled"
        );
        for (index, payout) in payouts {
            self.events.publish(LedgerEvent::RoundSettled {
                depositor: depositor.clone(),
                index,
                payout,
            });
        }
        self.events.publish(LedgerEvent::BatchSettled {
            depositor: depositor.clone(),
            indices: batch.settled_indices.clone(),
            principal: batch.principal,
            stable_reward: batch.stable_reward,
            bonus_reward: batch.bonus_reward,
        });
        Ok(batch)
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub async fn get_round(&self, depositor: &AccountId, index: usize) -> Result<Round> {
        Ok(self.ledger.get_round(depositor, index).await?)
    }

    pub async fn round_count(&self, depositor: &AccountId) -> usize {
        self.ledger.round_count(depositor).await
    }

    /// Principal of the depositor's unsettled rounds
    pub async fn total_lent(&self, depositor: &AccountId) -> Result<Amount> {
        self.ledger.total_lent(depositor).await
    }

    pub async fn finished_rounds(&self, depositor: &AccountId, now: Timestamp) -> Vec<usize> {
        self.ledger.finished_rounds(depositor, now).await
    }

    /// Live stable and bonus reward estimate for one round
    pub async fn rewards_of(
        &self,
        depositor: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<RewardBreakdown> {
        let round = self.ledger.get_round(depositor, index).await?;
        let stable_rate_bps = self.config.read().stable_rate_bps;
        let rewards = AccrualEngine::rewards(&round, stable_rate_bps, now)?;
        debug!(%depositor, index, stable = rewards.stable, bonus = rewards.bonus, "Rewards estimated");
        Ok(rewards)
    }

    pub async fn stable_reward_of(
        &self,
        depositor: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<Amount> {
        self.rewards_of(depositor, index, now).await.map(|r| r.stable)
    }

    pub async fn bonus_reward_of(
        &self,
        depositor: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<Amount> {
        self.rewards_of(depositor, index, now).await.map(|r| r.bonus)
    }

    pub async fn total_reward_of(
        &self,
        depositor: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<Amount> {
        self.rewards_of(depositor, index, now).await.map(|r| r.total)
    }

    /// Read access to the underlying ledger
    pub fn ledger(&self) -> &RoundLedger {
        &self.ledger
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn require_depositor(&self, caller: &AccountId, depositor: &AccountId, action: &str) -> Result<()> {
        if self.auth.authorize_depositor(caller, depositor) {
            Ok(())
        } else {
            warn!(%caller, %depositor, action, "Unauthorized");
            Err(TenureError::unauthorized(caller, format!("{} for {}", action, depositor)))
        }
    }
}

fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(TenureError::Overflow)
}
