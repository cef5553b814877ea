//! Error types for the Tenure ledger
//!
//! Provides a unified error type and the round/transfer error variants

use thiserror::Error;

use crate::types::{AccountId, Amount};

/// Result type alias using TenureError
pub type Result<T> = std::result::Result<T, TenureError>;

/// Unified error type for Tenure operations
#[derive(Debug, Error)]
pub enum TenureError {
    // Round lifecycle errors
    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    // Asset / bonus collaborator errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("{caller} is not authorized to {action}")]
    Unauthorized { caller: AccountId, action: String },

    #[error("Reward calculation overflow")]
    Overflow,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TenureError {
    /// Shorthand for an authorization failure
    pub fn unauthorized(caller: &AccountId, action: impl Into<String>) -> Self {
        TenureError::Unauthorized {
            caller: caller.clone(),
            action: action.into(),
        }
    }
}

/// Round creation, lookup and settlement errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("Amount lower than minimum deposit: {amount} < {minimum}")]
    BelowMinimumDeposit { amount: Amount, minimum: Amount },

    #[error("Round index {index} out of range ({count} rounds)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Round {index} is not finished yet ({remaining_secs}s remaining)")]
    RoundNotFinished { index: usize, remaining_secs: u64 },

    #[error("Round {index} has already been settled")]
    AlreadySettled { index: usize },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid tenure: {days} days")]
    InvalidTenure { days: u32 },
}

/// Errors surfaced by the asset-transfer and bonus-credit collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient funds or approval for {account}: required {required}, available {available}")]
    InsufficientFundsOrApproval {
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("Pool reserve exhausted: required {required}, available {available}")]
    ReserveExhausted { required: Amount, available: Amount },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for TenureError {
    fn from(err: serde_json::Error) -> Self {
        TenureError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TenureError {
    fn from(err: std::io::Error) -> Self {
        TenureError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for TenureError {
    fn from(err: anyhow::Error) -> Self {
        TenureError::Internal(err.to_string())
    }
}
