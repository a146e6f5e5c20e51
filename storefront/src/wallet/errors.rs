//! Wallet error types.

use std::time::Duration;
use thiserror::Error;

use super::models::{UserId, WalletStatus};
use crate::db::timeouts::TimeoutError;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transaction exceeded its deadline and was rolled back
    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),

    /// Row contents could not be decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Insufficient funds
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    /// Wallet not found
    #[error("Wallet not found for user {0}")]
    WalletNotFound(UserId),

    /// Wallet is suspended or closed
    #[error("Wallet is not active (status: {0})")]
    WalletInactive(WalletStatus),

    /// Currency mismatch
    #[error("Wallet currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Purchase without items
    #[error("Purchase must contain at least one item")]
    EmptyPurchase,

    /// Negative item cost
    #[error("Invalid cost {cost} for item {item_id}")]
    InvalidItemCost { item_id: String, cost: i64 },

    /// Malformed currency code
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Amount arithmetic would overflow
    #[error("Amount overflow")]
    BalanceOverflow,
}

/// Coarse classification used to pick a response class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any store interaction
    Validation,
    /// Transaction opened and rolled back on a business rule
    BusinessRule,
    /// Store or runtime failure
    Infrastructure,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Database(_)
            | WalletError::Storage(_)
            | WalletError::Timeout(_)
            | WalletError::CorruptRecord(_) => ErrorKind::Infrastructure,
            WalletError::InsufficientFunds { .. }
            | WalletError::WalletNotFound(_)
            | WalletError::WalletInactive(_)
            | WalletError::CurrencyMismatch { .. } => ErrorKind::BusinessRule,
            WalletError::InvalidAmount(_)
            | WalletError::EmptyPurchase
            | WalletError::InvalidItemCost { .. }
            | WalletError::InvalidCurrency(_)
            | WalletError::BalanceOverflow => ErrorKind::Validation,
        }
    }

    /// Stable machine-readable reason code
    pub fn reason_code(&self) -> &'static str {
        match self {
            WalletError::Database(_)
            | WalletError::Storage(_)
            | WalletError::Timeout(_)
            | WalletError::CorruptRecord(_) => "InternalError",
            WalletError::InsufficientFunds { .. } => "InsufficientFunds",
            WalletError::WalletNotFound(_) => "UserNotFound",
            WalletError::WalletInactive(_) => "WalletInactive",
            WalletError::CurrencyMismatch { .. } => "CurrencyMismatch",
            WalletError::InvalidAmount(_) | WalletError::BalanceOverflow => "InvalidAmount",
            WalletError::EmptyPurchase | WalletError::InvalidItemCost { .. } => "InvalidItems",
            WalletError::InvalidCurrency(_) => "InvalidCurrency",
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store errors are collapsed into a generic message, balances and user IDs
    /// are not echoed back.
    pub fn client_message(&self) -> String {
        match self {
            WalletError::Database(_)
            | WalletError::Storage(_)
            | WalletError::Timeout(_)
            | WalletError::CorruptRecord(_) => "Internal server error".to_string(),
            WalletError::InsufficientFunds { .. } => "Insufficient funds".to_string(),
            WalletError::WalletNotFound(_) => "User not found".to_string(),
            WalletError::WalletInactive(_) => "Wallet is not active".to_string(),
            WalletError::CurrencyMismatch { expected, .. } => {
                format!("Wallet currency mismatch: expected {expected}")
            }
            _ => self.to_string(),
        }
    }
}

impl From<TimeoutError> for WalletError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => WalletError::Timeout(duration),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
