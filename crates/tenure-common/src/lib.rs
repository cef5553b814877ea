//! # Tenure Common
//!
//! Shared types and errors for the Tenure fixed-term deposit ledger.
//!
//! ## Core Types
//!
//! - [`Round`]: one fixed-term deposit with its own principal, bonus rate and tenure
//! - [`PoolConfig`]: pool-wide stable rate, minimum deposit and asset unit
//! - [`Payout`]/[`BatchPayout`]: amounts released by settlement
//! - [`AccountId`]: opaque depositor / delegate / administrator identity

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Result, RoundError, TenureError, TransferError};
pub use types::{
    account::AccountId,
    amount::{Amount, AssetUnit, BasisPoints, Timestamp},
    pool_config::PoolConfig,
    round::{BatchPayout, Payout, Round, SECONDS_PER_DAY},
};

/// Tenure version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basis-point denominator (10_000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Seconds in a rate year (365 days, no leap years)
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;
