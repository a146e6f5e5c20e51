//! In-process wallet ledger.
//!
//! Mirrors the PostgreSQL ledger's semantics without a database: every wallet
//! row sits behind its own async mutex, and a transaction holds the row guard
//! from first touch until commit or drop, the same way `FOR UPDATE` holds a
//! row lock. Writes are staged inside the transaction and only published on
//! commit. Used by tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use crate::wallet::{
    Currency, LedgerTransaction, NewPurchase, PurchaseRecord, PurchaseStatus, UserId, Wallet,
    WalletError, WalletLedger, WalletResult, WalletStatus,
};

type RowHandle = Arc<RowLock<Wallet>>;

#[derive(Default)]
struct Inner {
    wallets: Mutex<HashMap<UserId, RowHandle>>,
    purchases: Mutex<Vec<PurchaseRecord>>,
    next_purchase_id: AtomicI64,
    fail_next_purchase_insert: AtomicBool,
    latency: Mutex<Option<Duration>>,
    commit_latency: Mutex<Option<Duration>>,
}

impl Inner {
    fn row(&self, user_id: UserId) -> Option<RowHandle> {
        self.wallets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
    }

    async fn simulate_latency(&self) {
        sleep_for(&self.latency).await;
    }
}

async fn sleep_for(slot: &Mutex<Option<Duration>>) {
    let latency = *slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

/// In-memory `WalletLedger`
#[derive(Clone, Default)]
pub struct MemoryWalletLedger {
    inner: Arc<Inner>,
}

impl MemoryWalletLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every transactional operation by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        *self
            .inner
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(latency);
        self
    }

    /// Delay every commit acknowledgement by `latency`
    ///
    /// The commit's writes are published before the delay.
    pub fn with_commit_latency(self, latency: Duration) -> Self {
        *self
            .inner
            .commit_latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(latency);
        self
    }

    /// Insert or replace a wallet row directly
    pub fn seed_wallet(
        &self,
        user_id: UserId,
        balance: i64,
        currency: Currency,
        status: WalletStatus,
    ) {
        let now = Utc::now();
        let wallet = Wallet {
            user_id,
            balance,
            currency,
            status,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .wallets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, Arc::new(RowLock::new(wallet)));
    }

    /// Make the next `insert_purchase` fail with a storage error
    pub fn fail_next_purchase_insert(&self) {
        self.inner
            .fail_next_purchase_insert
            .store(true, Ordering::SeqCst);
    }

    /// Number of committed purchase records across all users
    pub fn purchase_count(&self) -> usize {
        self.inner
            .purchases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl WalletLedger for MemoryWalletLedger {
    async fn begin(&self) -> WalletResult<Box<dyn LedgerTransaction>> {
        Ok(Box::new(MemoryLedgerTransaction {
            inner: self.inner.clone(),
            locked: HashMap::new(),
            staged: HashMap::new(),
            pending: Vec::new(),
        }))
    }

    async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet> {
        let row = self
            .inner
            .row(user_id)
            .ok_or(WalletError::WalletNotFound(user_id))?;
        let wallet = row.lock().await.clone();
        Ok(wallet)
    }

    async fn list_purchases(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> WalletResult<Vec<PurchaseRecord>> {
        let purchases = self
            .inner
            .purchases
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(purchases
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

/// Transaction over `MemoryWalletLedger`
pub struct MemoryLedgerTransaction {
    inner: Arc<Inner>,
    locked: HashMap<UserId, OwnedMutexGuard<Wallet>>,
    staged: HashMap<UserId, i64>,
    pending: Vec<PurchaseRecord>,
}

impl MemoryLedgerTransaction {
    async fn lock_row(&mut self, user_id: UserId) -> WalletResult<()> {
        if self.locked.contains_key(&user_id) {
            return Ok(());
        }
        let row = self
            .inner
            .row(user_id)
            .ok_or(WalletError::WalletNotFound(user_id))?;
        let guard = row.lock_owned().await;
        self.locked.insert(user_id, guard);
        Ok(())
    }

    fn current_balance(&self, user_id: UserId) -> Option<i64> {
        self.staged
            .get(&user_id)
            .copied()
            .or_else(|| self.locked.get(&user_id).map(|guard| guard.balance))
    }
}

#[async_trait]
impl LedgerTransaction for MemoryLedgerTransaction {
    async fn get_wallet_for_update(&mut self, user_id: UserId) -> WalletResult<Wallet> {
        self.lock_row(user_id).await?;
        self.inner.simulate_latency().await;

        let mut wallet = self
            .locked
            .get(&user_id)
            .map(|guard| (**guard).clone())
            .ok_or(WalletError::WalletNotFound(user_id))?;
        if let Some(balance) = self.staged.get(&user_id) {
            wallet.balance = *balance;
        }
        Ok(wallet)
    }

    async fn apply_delta(&mut self, user_id: UserId, delta: i64) -> WalletResult<i64> {
        self.lock_row(user_id).await?;
        self.inner.simulate_latency().await;

        let current = self
            .current_balance(user_id)
            .ok_or(WalletError::WalletNotFound(user_id))?;
        let next = current
            .checked_add(delta)
            .ok_or(WalletError::BalanceOverflow)?;
        if next < 0 {
            return Err(WalletError::InsufficientFunds {
                available: current,
                required: delta.saturating_neg(),
            });
        }

        self.staged.insert(user_id, next);
        Ok(next)
    }

    async fn insert_purchase(&mut self, purchase: &NewPurchase) -> WalletResult<PurchaseRecord> {
        self.inner.simulate_latency().await;

        if self
            .inner
            .fail_next_purchase_insert
            .swap(false, Ordering::SeqCst)
        {
            return Err(WalletError::Storage(
                "simulated failure inserting purchase".to_string(),
            ));
        }

        let record = PurchaseRecord {
            id: self.inner.next_purchase_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: purchase.user_id,
            items: purchase.items.clone(),
            total_cost: purchase.total_cost,
            currency: purchase.currency.clone(),
            status: PurchaseStatus::Completed,
            created_at: Utc::now(),
        };
        self.pending.push(record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> WalletResult<()> {
        let MemoryLedgerTransaction {
            inner,
            mut locked,
            staged,
            pending,
        } = *self;

        let now = Utc::now();
        for (user_id, balance) in staged {
            if let Some(guard) = locked.get_mut(&user_id) {
                guard.balance = balance;
                guard.updated_at = now;
            }
        }

        // Publish records while row guards are still held
        inner
            .purchases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(pending);

        drop(locked);
        sleep_for(&inner.commit_latency).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> WalletResult<()> {
        Ok(())
    }
}
