//! # Storefront
//!
//! Wallet-backed purchasing for a storefront backend.
//!
//! A purchase validates the requested items, locks the buyer's wallet row,
//! checks status, currency and balance, debits the total and records an
//! immutable purchase entry. The debit and the record commit together or not
//! at all. Fund additions take the same row lock, so concurrent operations on
//! one wallet are serialized.
//!
//! ## Core Modules
//!
//! - [`wallet`]: Purchase and fund-addition coordination over a [`wallet::WalletLedger`]
//! - [`db`]: PostgreSQL pooling, the PostgreSQL ledger and an in-memory ledger
//! - [`auth`]: Signup, login and JWT access tokens
//! - [`catalog`]: Read-only film/actor catalog in a second database
//!
//! ## Example
//!
//! ```
//! use storefront::db::MemoryWalletLedger;
//! use storefront::wallet::{Currency, ItemId, PurchaseItem, WalletConfig, WalletManager, WalletStatus};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), storefront::WalletError> {
//!     let ledger = MemoryWalletLedger::new();
//!     ledger.seed_wallet(1, 100, Currency::default(), WalletStatus::Active);
//!
//!     let wallets = WalletManager::new(Arc::new(ledger), WalletConfig::default());
//!     let items = vec![PurchaseItem { item_id: ItemId::Number(7), cost: 40 }];
//!     let receipt = wallets.attempt_purchase(1, items, None).await?;
//!     assert_eq!(receipt.new_balance, 60);
//!     Ok(())
//! }
//! ```

/// User registration, login and access tokens.
pub mod auth;

/// Film/actor catalog reads.
pub mod catalog;

/// Connection pooling and ledger stores.
pub mod db;

/// Wallet purchase and fund-addition flows.
pub mod wallet;

pub use auth::{AuthError, AuthManager};
pub use catalog::{CatalogError, CatalogRepository};
pub use db::{Database, DatabaseConfig, MemoryWalletLedger, PgWalletLedger};
pub use wallet::{WalletConfig, WalletError, WalletManager};
