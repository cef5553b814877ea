//! Round ledger
//!
//! Per-depositor, append-only books of rounds. A round's index is its offset
//! in the depositor's book and stays valid forever; settled rounds are kept as
//! records and only drop out of the lent balance and the finished list.
//!
//! Each book sits behind its own `tokio::sync::RwLock`, so depositors never
//! contend with each other and readers of one book always see it either
//! before or after a mutation, never halfway through.

use std::sync::Arc;

use dashmap::DashMap;
use tenure_common::{AccountId, Amount, BasisPoints, Round, RoundError, TenureError, Timestamp};
use tokio::sync::RwLock;
use tracing::debug;

use crate::accrual::AccrualEngine;
use crate::math::checked_sum;

/// All rounds of one depositor, in creation order
#[derive(Debug, Clone, Default)]
pub struct DepositorRounds {
    rounds: Vec<Round>,
}

impl DepositorRounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a new round against `minimum_deposit` and build it.
    ///
    /// Does not modify the book; pair with [`DepositorRounds::append`].
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_round(
        depositor: AccountId,
        amount: Amount,
        bonus_rate_bps: BasisPoints,
        tenure_days: u32,
        bonus_flag: bool,
        now: Timestamp,
        minimum_deposit: Amount,
    ) -> Result<Round, RoundError> {
        if amount < minimum_deposit {
            return Err(RoundError::BelowMinimumDeposit {
                amount,
                minimum: minimum_deposit,
            });
        }
        if amount == 0 {
            return Err(RoundError::InvalidAmount);
        }
        let tenure_seconds = match Round::tenure_from_days(tenure_days) {
            Some(secs) if secs > 0 => secs,
            _ => return Err(RoundError::InvalidTenure { days: tenure_days }),
        };

        Ok(Round {
            depositor,
            amount_lent: amount,
            bonus_rate_bps,
            tenure_seconds,
            bonus_flag,
            start_timestamp: now,
            settled: false,
        })
    }

    /// Append a prepared round and return its index
    pub fn append(&mut self, round: Round) -> usize {
        self.rounds.push(round);
        self.rounds.len() - 1
    }

    pub fn get(&self, index: usize) -> Result<&Round, RoundError> {
        self.rounds.get(index).ok_or(RoundError::IndexOutOfRange {
            index,
            count: self.rounds.len(),
        })
    }

    /// Number of rounds ever created, settled ones included
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter()
    }

    /// Principal of rounds not yet settled
    pub fn total_lent(&self) -> tenure_common::Result<Amount> {
        checked_sum(
            self.rounds
                .iter()
                .filter(|r| r.is_outstanding())
                .map(|r| r.amount_lent),
        )
        .ok_or(TenureError::Overflow)
    }

    /// Indices of finished, unsettled rounds in ascending order
    pub fn finished(&self, now: Timestamp) -> Vec<usize> {
        self.rounds
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_outstanding() && AccrualEngine::is_finished(r, now))
            .map(|(i, _)| i)
            .collect()
    }

    /// Flag a round as paid out. Callers validate before committing.
    pub(crate) fn mark_settled(&mut self, index: usize) -> Result<(), RoundError> {
        let count = self.rounds.len();
        let round = self
            .rounds
            .get_mut(index)
            .ok_or(RoundError::IndexOutOfRange { index, count })?;
        if round.settled {
            return Err(RoundError::AlreadySettled { index });
        }
        round.settled = true;
        Ok(())
    }
}

/// Shared handle to one depositor's book
pub type SharedRounds = Arc<RwLock<DepositorRounds>>;

/// Books of every depositor
#[derive(Debug, Default)]
pub struct RoundLedger {
    books: DashMap<AccountId, SharedRounds>,
}

impl RoundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book for `depositor`, created empty on first use
    pub(crate) fn book(&self, depositor: &AccountId) -> SharedRounds {
        self.books.entry(depositor.clone()).or_default().clone()
    }

    /// Book for `depositor` if one exists
    pub(crate) fn existing(&self, depositor: &AccountId) -> Option<SharedRounds> {
        self.books.get(depositor).map(|b| b.value().clone())
    }

    /// Validate and append a round, returning its index.
    ///
    /// This is the bare ledger operation; it moves no funds. The settlement
    /// coordinator wraps the same steps around the asset pull.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_round(
        &self,
        depositor: &AccountId,
        amount: Amount,
        bonus_rate_bps: BasisPoints,
        tenure_days: u32,
        bonus_flag: bool,
        now: Timestamp,
        minimum_deposit: Amount,
    ) -> Result<usize, RoundError> {
        let round = DepositorRounds::prepare_round(
            depositor.clone(),
            amount,
            bonus_rate_bps,
            tenure_days,
            bonus_flag,
            now,
            minimum_deposit,
        )?;
        let book = self.book(depositor);
        let index = book.write().await.append(round);
        debug!(%depositor, index, amount, "Round appended");
        Ok(index)
    }

    pub async fn get_round(
        &self,
        depositor: &AccountId,
        index: usize,
    ) -> Result<Round, RoundError> {
        match self.existing(depositor) {
            Some(book) => book.read().await.get(index).cloned(),
            None => Err(RoundError::IndexOutOfRange { index, count: 0 }),
        }
    }

    pub async fn round_count(&self, depositor: &AccountId) -> usize {
        match self.existing(depositor) {
            Some(book) => book.read().await.len(),
            None => 0,
        }
    }

    pub async fn total_lent(&self, depositor: &AccountId) -> tenure_common::Result<Amount> {
        match self.existing(depositor) {
            Some(book) => book.read().await.total_lent(),
            None => Ok(0),
        }
    }

    /// Finished, unsettled indices, recomputed on every call
    pub async fn finished_rounds(&self, depositor: &AccountId, now: Timestamp) -> Vec<usize> {
        match self.existing(depositor) {
            Some(book) => book.read().await.finished(now),
            None => Vec::new(),
        }
    }

    /// Snapshot of every round of `depositor`
    pub async fn rounds(&self, depositor: &AccountId) -> Vec<Round> {
        match self.existing(depositor) {
            Some(book) => book.read().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Depositors that have at least touched the ledger, sorted
    pub fn depositors(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.books.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Unsettled principal across all depositors
    pub async fn pool_total_lent(&self) -> tenure_common::Result<Amount> {
        let books: Vec<SharedRounds> = self.books.iter().map(|e| e.value().clone()).collect();
        let mut totals = Vec::with_capacity(books.len());
        for book in books {
            totals.push(book.read().await.total_lent()?);
        }
        checked_sum(totals).ok_or(TenureError::Overflow)
    }

    /// Drop `depositor`'s book if it is empty and nobody else holds it.
    ///
    /// Callers release their own handle first. Handles are only cloned under
    /// the shard lock `remove_if` holds, so a count of one is stable here.
    pub(crate) fn discard_if_empty(&self, depositor: &AccountId) {
        let removed = self
            .books
            .remove_if(depositor, |_, book| {
                Arc::strong_count(book) == 1
                    && book.try_read().map(|rounds| rounds.is_empty()).unwrap_or(false)
            })
            .is_some();
        if removed {
            debug!(%depositor, "Empty book discarded");
        }
    }
}
