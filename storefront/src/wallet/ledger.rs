//! Ledger trait definitions.
//!
//! `WalletLedger` is the store handle shared across requests; each flow opens
//! its own `LedgerTransaction`. Transactions are the only place balances are
//! written. A transaction dropped without `commit` is rolled back.

use async_trait::async_trait;

use super::{
    errors::WalletResult,
    models::{NewPurchase, PurchaseRecord, UserId, Wallet},
};

/// Store handle for wallets and purchases
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> WalletResult<Box<dyn LedgerTransaction>>;

    /// Read a wallet outside of any transaction
    async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet>;

    /// Purchases for a user, newest first
    async fn list_purchases(&self, user_id: UserId, limit: i64)
    -> WalletResult<Vec<PurchaseRecord>>;
}

/// Scoped transaction over the ledger
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Read and lock a wallet row until commit or rollback
    async fn get_wallet_for_update(&mut self, user_id: UserId) -> WalletResult<Wallet>;

    /// Add `delta` to the balance and return the new balance
    ///
    /// Fails with `InsufficientFunds` rather than take the balance below zero.
    async fn apply_delta(&mut self, user_id: UserId, delta: i64) -> WalletResult<i64>;

    /// Append a completed purchase record
    async fn insert_purchase(&mut self, purchase: &NewPurchase) -> WalletResult<PurchaseRecord>;

    async fn commit(self: Box<Self>) -> WalletResult<()>;

    async fn rollback(self: Box<Self>) -> WalletResult<()>;
}
