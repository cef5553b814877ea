//! Core data types for the Tenure ledger

pub mod account;
pub mod amount;
pub mod pool_config;
pub mod round;

pub use account::AccountId;
pub use amount::{Amount, AssetUnit, BasisPoints, Timestamp};
pub use pool_config::PoolConfig;
pub use round::{BatchPayout, Payout, Round};
