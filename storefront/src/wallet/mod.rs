//! Wallet module providing balances, fund additions and atomic purchases.
//!
//! This module implements:
//! - One wallet per user with a currency and an active/suspended/closed status
//! - Purchases that debit the wallet and append a purchase record in one transaction
//! - Fund additions under the same row-locking discipline
//! - A ledger abstraction with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```no_run
//! use storefront::db::{Database, PgWalletLedger};
//! use storefront::wallet::{ItemId, PurchaseItem, WalletConfig, WalletManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let ledger = Arc::new(PgWalletLedger::new(Arc::new(db.pool().clone())));
//!     let wallets = WalletManager::new(ledger, WalletConfig::default());
//!
//!     let balance = wallets.add_funds(1, 5_000, None).await?;
//!     println!("Balance after top-up: {}", balance);
//!
//!     let receipt = wallets
//!         .attempt_purchase(1, vec![PurchaseItem { item_id: ItemId::Number(3), cost: 1_250 }], None)
//!         .await?;
//!     println!("New balance after purchase: {}", receipt.new_balance);
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ledger;
pub mod manager;
pub mod models;

pub use errors::{ErrorKind, WalletError, WalletResult};
pub use ledger::{LedgerTransaction, WalletLedger};
pub use manager::{MAX_HISTORY_LIMIT, WalletConfig, WalletManager};
pub use models::{
    Currency, ItemId, NewPurchase, PurchaseId, PurchaseItem, PurchaseReceipt, PurchaseRecord,
    PurchaseStatus, UserId, Wallet, WalletStatus, total_cost,
};
