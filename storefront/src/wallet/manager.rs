//! Wallet manager: purchase coordination and fund additions.
//!
//! Both flows run as a single ledger transaction that locks the caller's
//! wallet row before any check. A failed step rolls the transaction back.
//! Everything up to the commit runs under a deadline; a timed-out or cancelled
//! flow drops its transaction, which also rolls it back and releases the row
//! lock. The commit runs outside the deadline: once it starts, the caller sees
//! its outcome rather than a timeout.

use std::{sync::Arc, time::Duration};

use super::{
    errors::{ErrorKind, WalletError, WalletResult},
    ledger::{LedgerTransaction, WalletLedger},
    models::{
        Currency, NewPurchase, PurchaseItem, PurchaseReceipt, PurchaseRecord, UserId, Wallet,
        total_cost,
    },
};
use crate::db::timeouts::{DEFAULT_QUERY_TIMEOUT, DEFAULT_TRANSACTION_TIMEOUT, with_timeout};

/// Maximum number of purchase records returned by `purchase_history`
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Wallet manager configuration
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Currency assumed when a purchase request names none
    pub default_currency: Currency,
    /// Deadline for a whole purchase or fund-addition transaction
    pub transaction_timeout: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::default(),
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }
}

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    ledger: Arc<dyn WalletLedger>,
    config: WalletConfig,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `ledger` - Store the manager reads and writes wallets through
    /// * `config` - Default currency and transaction deadline
    pub fn new(ledger: Arc<dyn WalletLedger>, config: WalletConfig) -> Self {
        Self { ledger, config }
    }

    /// Get the caller's wallet
    pub async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet> {
        with_timeout(DEFAULT_QUERY_TIMEOUT, self.ledger.get_wallet(user_id))
            .await
            .inspect_err(|e| {
                if e.kind() == ErrorKind::Infrastructure {
                    log::error!("Failed to read wallet for user {user_id}: {e}");
                }
            })
    }

    /// Get the caller's purchases, newest first
    ///
    /// `limit` is clamped to `1..=MAX_HISTORY_LIMIT`.
    pub async fn purchase_history(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> WalletResult<Vec<PurchaseRecord>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        with_timeout(DEFAULT_QUERY_TIMEOUT, self.ledger.list_purchases(user_id, limit)).await
    }

    /// Debit the caller's wallet for `items` and record the purchase
    ///
    /// # Arguments
    ///
    /// * `user_id` - Authenticated caller
    /// * `items` - Purchased items; the total is computed here, never taken from the caller
    /// * `currency` - Currency the caller expects to pay in; defaults to the configured currency
    ///
    /// # Returns
    ///
    /// * `WalletResult<PurchaseReceipt>` - Receipt with the new balance
    ///
    /// # Errors
    ///
    /// * `WalletError::EmptyPurchase` / `InvalidItemCost` - Rejected before any store access
    /// * `WalletError::WalletNotFound` - Caller has no wallet
    /// * `WalletError::WalletInactive` - Wallet is suspended or closed
    /// * `WalletError::CurrencyMismatch` - Wallet holds a different currency
    /// * `WalletError::InsufficientFunds` - Balance below the total
    pub async fn attempt_purchase(
        &self,
        user_id: UserId,
        items: Vec<PurchaseItem>,
        currency: Option<Currency>,
    ) -> WalletResult<PurchaseReceipt> {
        let total = total_cost(&items)?;
        let currency = currency.unwrap_or_else(|| self.config.default_currency.clone());
        let purchase = NewPurchase {
            user_id,
            items,
            total_cost: total,
            currency,
        };

        let result = match with_timeout(
            self.config.transaction_timeout,
            self.stage_purchase(purchase),
        )
        .await
        {
            Ok((tx, receipt)) => tx.commit().await.map(|()| receipt),
            Err(e) => Err(e),
        };

        match &result {
            Ok(receipt) => log::info!(
                "Purchase {} by user {user_id}: debited {} {}, new balance {}",
                receipt.purchase_id,
                receipt.total_cost,
                receipt.currency,
                receipt.new_balance
            ),
            Err(e) => log_failure("purchase", user_id, e),
        }

        result
    }

    /// Debit and record without committing; the open transaction is handed back
    async fn stage_purchase(
        &self,
        purchase: NewPurchase,
    ) -> WalletResult<(Box<dyn LedgerTransaction>, PurchaseReceipt)> {
        let mut tx = self.ledger.begin().await?;

        let outcome = debit_and_record(tx.as_mut(), &purchase).await;
        match outcome {
            Ok(receipt) => Ok((tx, receipt)),
            Err(e) => {
                rollback(tx, purchase.user_id).await;
                Err(e)
            }
        }
    }

    /// Credit the caller's wallet
    ///
    /// # Arguments
    ///
    /// * `user_id` - Authenticated caller
    /// * `amount` - Positive amount in minor units
    /// * `currency` - Expected wallet currency; defaults to the wallet's own
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - New balance
    pub async fn add_funds(
        &self,
        user_id: UserId,
        amount: i64,
        currency: Option<Currency>,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let result = match with_timeout(
            self.config.transaction_timeout,
            self.stage_credit(user_id, amount, currency),
        )
        .await
        {
            Ok((tx, new_balance)) => tx.commit().await.map(|()| new_balance),
            Err(e) => Err(e),
        };

        match &result {
            Ok(balance) => {
                log::info!("Added {amount} to wallet of user {user_id}, new balance {balance}")
            }
            Err(e) => log_failure("add_funds", user_id, e),
        }

        result
    }

    async fn stage_credit(
        &self,
        user_id: UserId,
        amount: i64,
        currency: Option<Currency>,
    ) -> WalletResult<(Box<dyn LedgerTransaction>, i64)> {
        let mut tx = self.ledger.begin().await?;

        let outcome = credit(tx.as_mut(), user_id, amount, currency).await;
        match outcome {
            Ok(new_balance) => Ok((tx, new_balance)),
            Err(e) => {
                rollback(tx, user_id).await;
                Err(e)
            }
        }
    }
}

/// Lock, check, debit and record inside an open transaction
async fn debit_and_record(
    tx: &mut dyn LedgerTransaction,
    purchase: &NewPurchase,
) -> WalletResult<PurchaseReceipt> {
    let wallet = tx.get_wallet_for_update(purchase.user_id).await?;
    check_wallet(&wallet, &purchase.currency)?;
    if wallet.balance < purchase.total_cost {
        return Err(WalletError::InsufficientFunds {
            available: wallet.balance,
            required: purchase.total_cost,
        });
    }

    let new_balance = tx
        .apply_delta(purchase.user_id, -purchase.total_cost)
        .await?;
    let record = tx.insert_purchase(purchase).await?;

    Ok(PurchaseReceipt {
        purchase_id: record.id,
        total_cost: record.total_cost,
        currency: record.currency,
        new_balance,
    })
}

/// Lock, check and credit inside an open transaction
async fn credit(
    tx: &mut dyn LedgerTransaction,
    user_id: UserId,
    amount: i64,
    currency: Option<Currency>,
) -> WalletResult<i64> {
    let wallet = tx.get_wallet_for_update(user_id).await?;
    let currency = currency.unwrap_or_else(|| wallet.currency.clone());
    check_wallet(&wallet, &currency)?;
    wallet
        .balance
        .checked_add(amount)
        .ok_or(WalletError::BalanceOverflow)?;

    tx.apply_delta(user_id, amount).await
}

/// Roll back, logging rather than masking the original error
async fn rollback(tx: Box<dyn LedgerTransaction>, user_id: UserId) {
    if let Err(e) = tx.rollback().await {
        log::warn!("Rollback failed for user {user_id}: {e}");
    }
}

/// Status and currency checks shared by debits and credits
fn check_wallet(wallet: &Wallet, currency: &Currency) -> WalletResult<()> {
    if !wallet.is_active() {
        return Err(WalletError::WalletInactive(wallet.status));
    }
    if &wallet.currency != currency {
        return Err(WalletError::CurrencyMismatch {
            expected: wallet.currency.to_string(),
            got: currency.to_string(),
        });
    }
    Ok(())
}

fn log_failure(operation: &str, user_id: UserId, err: &WalletError) {
    match err.kind() {
        ErrorKind::Infrastructure => {
            log::error!("{operation} for user {user_id} rolled back: {err}")
        }
        ErrorKind::BusinessRule => {
            log::info!("{operation} for user {user_id} rejected: {err}")
        }
        ErrorKind::Validation => {
            log::debug!("{operation} for user {user_id} invalid: {err}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletStatus;
    use chrono::Utc;

    fn wallet(status: WalletStatus, currency: &str) -> Wallet {
        Wallet {
            user_id: 1,
            balance: 100,
            currency: Currency::new(currency).unwrap(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_check_wallet_accepts_active_matching_currency() {
        let usd = Currency::new("USD").unwrap();
        assert!(check_wallet(&wallet(WalletStatus::Active, "USD"), &usd).is_ok());
    }

    #[test]
    fn test_check_wallet_status_before_currency() {
        let eur = Currency::new("EUR").unwrap();
        let err = check_wallet(&wallet(WalletStatus::Closed, "USD"), &eur).unwrap_err();
        assert!(matches!(err, WalletError::WalletInactive(WalletStatus::Closed)));
    }

    #[test]
    fn test_check_wallet_currency_mismatch() {
        let eur = Currency::new("EUR").unwrap();
        let err = check_wallet(&wallet(WalletStatus::Active, "USD"), &eur).unwrap_err();
        assert!(matches!(
            err,
            WalletError::CurrencyMismatch { ref expected, ref got } if expected == "USD" && got == "EUR"
        ));
    }

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert_eq!(config.default_currency.as_str(), "USD");
        assert_eq!(config.transaction_timeout, DEFAULT_TRANSACTION_TIMEOUT);
    }
}
