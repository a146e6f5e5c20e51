//! Integration tests for purchase and fund-addition flows.
//!
//! Runs against the in-memory ledger, so no database is required. Covers the
//! happy path, every business-rule rejection, rollback on store failure and
//! timeout, and serialization of concurrent operations on one wallet.

use std::{sync::Arc, time::Duration};

use storefront::db::MemoryWalletLedger;
use storefront::wallet::{
    Currency, ErrorKind, ItemId, PurchaseItem, WalletConfig, WalletError, WalletManager,
    WalletStatus,
};

fn usd() -> Currency {
    Currency::new("USD").unwrap()
}

fn item(id: i64, cost: i64) -> PurchaseItem {
    PurchaseItem {
        item_id: ItemId::Number(id),
        cost,
    }
}

/// Manager over a ledger holding one wallet for user 1
fn setup(balance: i64, status: WalletStatus) -> (WalletManager, MemoryWalletLedger) {
    let ledger = MemoryWalletLedger::new();
    ledger.seed_wallet(1, balance, usd(), status);
    let manager = WalletManager::new(Arc::new(ledger.clone()), WalletConfig::default());
    (manager, ledger)
}

#[tokio::test]
async fn test_purchase_debits_and_records() {
    let (manager, ledger) = setup(100, WalletStatus::Active);

    let receipt = manager
        .attempt_purchase(1, vec![item(1, 15), item(2, 25)], None)
        .await
        .expect("purchase should succeed");

    assert_eq!(receipt.total_cost, 40);
    assert_eq!(receipt.new_balance, 60);
    assert_eq!(receipt.currency, usd());
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 60);
    assert_eq!(ledger.purchase_count(), 1);

    let history = manager.purchase_history(1, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, receipt.purchase_id);
    assert_eq!(history[0].total_cost, 40);
    assert_eq!(history[0].items.len(), 2);
}

#[tokio::test]
async fn test_purchase_of_exact_balance_leaves_zero() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let receipt = manager
        .attempt_purchase(1, vec![item(1, 100)], None)
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, 0);
}

#[tokio::test]
async fn test_insufficient_funds_changes_nothing() {
    let (manager, ledger) = setup(100, WalletStatus::Active);

    let err = manager
        .attempt_purchase(1, vec![item(1, 150)], None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WalletError::InsufficientFunds {
            available: 100,
            required: 150
        }
    ));
    assert_eq!(err.client_message(), "Insufficient funds");
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
    assert_eq!(ledger.purchase_count(), 0);
}

#[tokio::test]
async fn test_invalid_items_rejected_before_store() {
    let (manager, ledger) = setup(100, WalletStatus::Active);

    let err = manager.attempt_purchase(1, vec![], None).await.unwrap_err();
    assert!(matches!(err, WalletError::EmptyPurchase));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = manager
        .attempt_purchase(1, vec![item(1, 10), item(2, -5)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidItemCost { cost: -5, .. }));

    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
    assert_eq!(ledger.purchase_count(), 0);
}

#[tokio::test]
async fn test_free_items_are_recorded() {
    let (manager, ledger) = setup(100, WalletStatus::Active);

    let receipt = manager
        .attempt_purchase(1, vec![item(1, 0)], None)
        .await
        .unwrap();
    assert_eq!(receipt.total_cost, 0);
    assert_eq!(receipt.new_balance, 100);
    assert_eq!(ledger.purchase_count(), 1);
}

#[tokio::test]
async fn test_purchase_without_wallet() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let err = manager
        .attempt_purchase(99, vec![item(1, 10)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::WalletNotFound(99)));
    assert_eq!(err.reason_code(), "UserNotFound");
}

#[tokio::test]
async fn test_purchase_from_suspended_wallet() {
    let (manager, ledger) = setup(100, WalletStatus::Suspended);

    let err = manager
        .attempt_purchase(1, vec![item(1, 10)], None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::WalletInactive(WalletStatus::Suspended)
    ));
    assert_eq!(ledger.purchase_count(), 0);
}

#[tokio::test]
async fn test_purchase_currency_mismatch() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let err = manager
        .attempt_purchase(1, vec![item(1, 10)], Some(Currency::new("EUR").unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::CurrencyMismatch { .. }));
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_add_funds_credits_wallet() {
    let (manager, _) = setup(100, WalletStatus::Active);

    assert_eq!(manager.add_funds(1, 50, None).await.unwrap(), 150);
    assert_eq!(manager.add_funds(1, 5, Some(usd())).await.unwrap(), 155);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 155);
}

#[tokio::test]
async fn test_add_funds_rejects_non_positive_amount() {
    let (manager, _) = setup(100, WalletStatus::Active);

    for amount in [0, -1, i64::MIN] {
        let err = manager.add_funds(1, amount, None).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(a) if a == amount));
    }
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_add_funds_to_suspended_wallet() {
    let (manager, _) = setup(100, WalletStatus::Suspended);

    let err = manager.add_funds(1, 50, None).await.unwrap_err();
    assert!(matches!(err, WalletError::WalletInactive(_)));
    assert_eq!(err.reason_code(), "WalletInactive");
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_add_funds_currency_mismatch() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let err = manager
        .add_funds(1, 50, Some(Currency::new("EUR").unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        WalletError::CurrencyMismatch { expected, got } if expected == "USD" && got == "EUR"
    ));
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
}

#[tokio::test]
async fn test_add_funds_overflow_is_rejected() {
    let (manager, _) = setup(i64::MAX - 1, WalletStatus::Active);

    let err = manager.add_funds(1, 10, None).await.unwrap_err();
    assert!(matches!(err, WalletError::BalanceOverflow));
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, i64::MAX - 1);
}

#[tokio::test]
async fn test_failed_record_insert_rolls_back_debit() {
    let (manager, ledger) = setup(100, WalletStatus::Active);
    ledger.fail_next_purchase_insert();

    let err = manager
        .attempt_purchase(1, vec![item(1, 40)], None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(err.client_message(), "Internal server error");
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
    assert_eq!(ledger.purchase_count(), 0);

    // Lock was released, so the next purchase goes through
    let receipt = manager
        .attempt_purchase(1, vec![item(1, 40)], None)
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, 60);
}

#[tokio::test]
async fn test_timed_out_transaction_rolls_back() {
    let ledger = MemoryWalletLedger::new().with_latency(Duration::from_millis(200));
    ledger.seed_wallet(1, 100, usd(), WalletStatus::Active);
    let config = WalletConfig {
        transaction_timeout: Duration::from_millis(50),
        ..WalletConfig::default()
    };
    let manager = WalletManager::new(Arc::new(ledger.clone()), config);

    let err = manager
        .attempt_purchase(1, vec![item(1, 40)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Timeout(_)));
    assert_eq!(err.kind(), ErrorKind::Infrastructure);

    assert_eq!(ledger.purchase_count(), 0);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 100);
}

/// Manager whose commits publish immediately but acknowledge after the deadline
fn setup_slow_commit(balance: i64) -> (WalletManager, MemoryWalletLedger) {
    let ledger = MemoryWalletLedger::new().with_commit_latency(Duration::from_millis(200));
    ledger.seed_wallet(1, balance, usd(), WalletStatus::Active);
    let config = WalletConfig {
        transaction_timeout: Duration::from_millis(50),
        ..WalletConfig::default()
    };
    (WalletManager::new(Arc::new(ledger.clone()), config), ledger)
}

#[tokio::test]
async fn test_slow_commit_reports_committed_purchase() {
    let (manager, ledger) = setup_slow_commit(100);

    let receipt = manager
        .attempt_purchase(1, vec![item(1, 40)], None)
        .await
        .expect("a committed purchase must not be reported as failed");

    assert_eq!(receipt.new_balance, 60);
    assert_eq!(ledger.purchase_count(), 1);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 60);
}

#[tokio::test]
async fn test_slow_commit_reports_committed_credit() {
    let (manager, _) = setup_slow_commit(100);

    let balance = manager
        .add_funds(1, 25, None)
        .await
        .expect("a committed credit must not be reported as failed");

    assert_eq!(balance, 125);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 125);
}

#[tokio::test]
async fn test_concurrent_purchases_cannot_overdraw() {
    let (manager, ledger) = setup(100, WalletStatus::Active);
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.attempt_purchase(1, vec![item(i, 60)], None).await })
        })
        .collect();

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                successes += 1;
                assert_eq!(receipt.new_balance, 40);
            }
            Err(WalletError::InsufficientFunds { available, .. }) => {
                insufficient += 1;
                assert_eq!(available, 40);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 40);
    assert_eq!(ledger.purchase_count(), 1);
}

#[tokio::test]
async fn test_concurrent_credit_and_debit_serialize() {
    let (manager, _) = setup(100, WalletStatus::Active);
    let manager = Arc::new(manager);

    let mut handles = Vec::new();
    for i in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                manager.add_funds(1, 30, None).await.map(|_| ())
            } else {
                manager
                    .attempt_purchase(1, vec![item(i, 20)], None)
                    .await
                    .map(|_| ())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("every operation fits the balance");
    }

    // 100 + 5 * 30 - 5 * 20
    assert_eq!(manager.get_wallet(1).await.unwrap().balance, 150);
    assert_eq!(manager.purchase_history(1, 50).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_wallet_read_is_idempotent() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let first = manager.get_wallet(1).await.unwrap();
    let second = manager.get_wallet(1).await.unwrap();
    assert_eq!(first.balance, second.balance);
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let (manager, _) = setup(1_000, WalletStatus::Active);

    for cost in [10, 20, 30] {
        manager
            .attempt_purchase(1, vec![item(cost, cost)], None)
            .await
            .unwrap();
    }

    let history = manager.purchase_history(1, 2).await.unwrap();
    let costs: Vec<i64> = history.iter().map(|p| p.total_cost).collect();
    assert_eq!(costs, vec![30, 20]);

    // Non-positive limits are clamped to one entry
    assert_eq!(manager.purchase_history(1, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_text_item_ids_round_trip_into_history() {
    let (manager, _) = setup(100, WalletStatus::Active);

    let items = vec![PurchaseItem {
        item_id: ItemId::Text("sku-42".to_string()),
        cost: 12,
    }];
    manager.attempt_purchase(1, items, None).await.unwrap();

    let history = manager.purchase_history(1, 1).await.unwrap();
    assert_eq!(history[0].items[0].item_id, ItemId::Text("sku-42".to_string()));
}
