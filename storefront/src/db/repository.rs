//! PostgreSQL implementation of the wallet ledger.
//!
//! Wallet rows are locked with `SELECT ... FOR UPDATE` for the lifetime of a
//! `PgLedgerTransaction`. The underlying `sqlx::Transaction` rolls back when
//! dropped, so early returns and cancelled futures never leave a transaction
//! open.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

use crate::wallet::{
    Currency, LedgerTransaction, NewPurchase, PurchaseRecord, PurchaseStatus, UserId, Wallet,
    WalletError, WalletLedger, WalletResult, WalletStatus,
};

const WALLET_COLUMNS: &str = "user_id, balance, currency, status, created_at, updated_at";

/// Default PostgreSQL implementation of `WalletLedger`
#[derive(Clone)]
pub struct PgWalletLedger {
    pool: Arc<PgPool>,
}

impl PgWalletLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Transaction handle owned by a single in-flight request
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

/// Insert an empty active wallet using an existing connection or transaction
///
/// Used by signup so the user row and its wallet commit together.
pub async fn insert_wallet(
    conn: &mut PgConnection,
    user_id: UserId,
    currency: &Currency,
) -> WalletResult<Wallet> {
    let row = sqlx::query(&format!(
        "INSERT INTO wallets (user_id, balance, currency, status)
         VALUES ($1, 0, $2, 'active')
         RETURNING {WALLET_COLUMNS}"
    ))
    .bind(user_id)
    .bind(currency.as_str())
    .fetch_one(conn)
    .await?;

    wallet_from_row(&row)
}

fn wallet_from_row(row: &PgRow) -> WalletResult<Wallet> {
    Ok(Wallet {
        user_id: row.try_get("user_id")?,
        balance: row.try_get("balance")?,
        currency: Currency::new(row.try_get::<&str, _>("currency")?)
            .map_err(|e| WalletError::CorruptRecord(e.to_string()))?,
        status: row.try_get::<&str, _>("status")?.parse::<WalletStatus>()?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
        updated_at: row
            .try_get::<chrono::NaiveDateTime, _>("updated_at")?
            .and_utc(),
    })
}

fn purchase_from_row(row: &PgRow) -> WalletResult<PurchaseRecord> {
    let items_json: &str = row.try_get("items")?;
    let items = serde_json::from_str(items_json)
        .map_err(|e| WalletError::CorruptRecord(format!("purchase items: {e}")))?;

    Ok(PurchaseRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items,
        total_cost: row.try_get("total_cost")?,
        currency: Currency::new(row.try_get::<&str, _>("currency")?)
            .map_err(|e| WalletError::CorruptRecord(e.to_string()))?,
        status: row.try_get::<&str, _>("status")?.parse::<PurchaseStatus>()?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
    })
}

#[async_trait]
impl WalletLedger for PgWalletLedger {
    async fn begin(&self) -> WalletResult<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

        wallet_from_row(&row)
    }

    async fn list_purchases(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> WalletResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, items::text AS items, total_cost, currency, status, created_at
            FROM purchases
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(purchase_from_row).collect()
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn get_wallet_for_update(&mut self, user_id: UserId) -> WalletResult<Wallet> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

        wallet_from_row(&row)
    }

    async fn apply_delta(&mut self, user_id: UserId, delta: i64) -> WalletResult<i64> {
        // Balance check and update in one statement
        let updated = sqlx::query(
            "UPDATE wallets
             SET balance = balance + $1, updated_at = NOW()
             WHERE user_id = $2 AND balance + $1 >= 0
             RETURNING balance",
        )
        .bind(delta)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match updated {
            Some(row) => Ok(row.try_get("balance")?),
            None => {
                // Either wallet doesn't exist or the debit would overdraw it
                let current = sqlx::query("SELECT balance FROM wallets WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&mut *self.tx)
                    .await?;

                match current {
                    Some(row) => Err(WalletError::InsufficientFunds {
                        available: row.try_get("balance")?,
                        required: delta.saturating_neg(),
                    }),
                    None => Err(WalletError::WalletNotFound(user_id)),
                }
            }
        }
    }

    async fn insert_purchase(&mut self, purchase: &NewPurchase) -> WalletResult<PurchaseRecord> {
        let items = serde_json::to_string(&purchase.items)
            .map_err(|e| WalletError::CorruptRecord(format!("purchase items: {e}")))?;

        let row = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, items, total_cost, currency, status)
            VALUES ($1, $2::jsonb, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(purchase.user_id)
        .bind(items)
        .bind(purchase.total_cost)
        .bind(purchase.currency.as_str())
        .bind(PurchaseStatus::Completed.to_string())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(PurchaseRecord {
            id: row.try_get("id")?,
            user_id: purchase.user_id,
            items: purchase.items.clone(),
            total_cost: purchase.total_cost,
            currency: purchase.currency.clone(),
            status: PurchaseStatus::Completed,
            created_at: row
                .try_get::<chrono::NaiveDateTime, _>("created_at")?
                .and_utc(),
        })
    }

    async fn commit(self: Box<Self>) -> WalletResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> WalletResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
