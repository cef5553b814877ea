//! # Tenure Ledger
//!
//! Round accrual and settlement engine for fixed-term deposits.
//!
//! ## Reward Formula
//!
//! ```text
//! reward = floor(principal × rate_bps × elapsed / (10_000 × 365 days))
//! ```
//!
//! Where:
//! - rate_bps: the pool's stable rate or the round's own bonus rate
//! - elapsed: seconds since the round started, capped at its tenure
//!
//! ## Components
//!
//! - [`AccrualEngine`]: stateless stable / bonus / total reward math
//! - [`RoundLedger`]: per-depositor append-only books of rounds
//! - [`SettlementCoordinator`]: creation, single and batch withdrawal,
//!   minimum-deposit administration
//! - [`collaborators`]: asset transfer, bonus credit, authorization and clock
//!   interfaces with in-memory implementations

pub mod accrual;
pub mod collaborators;
pub mod config;
pub mod events;
pub mod ledger;
pub mod math;
pub mod settlement;

pub use accrual::{AccrualEngine, RewardBreakdown};
pub use collaborators::{
    AssetTransfer, Authorizer, BonusCredit, Clock, Collaborators, DelegationAuthorizer,
    InMemoryBonusLedger, InMemoryVault, ManualClock, SystemClock,
};
pub use config::{LedgerConfig, PoolSettings};
pub use events::{EventBus, LedgerEvent};
pub use ledger::{DepositorRounds, RoundLedger};
pub use settlement::{LenderPool, SettlementCoordinator};

/// Default stable rate (5%)
pub const DEFAULT_STABLE_RATE_BPS: u32 = 500;

/// Default per-subscriber event buffer
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
