//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::WalletError;

/// User ID type
pub type UserId = i64;

/// Purchase ID type
pub type PurchaseId = i64;

/// Three-letter currency code (upper-case ASCII), e.g. `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse and normalize a currency code.
    ///
    /// Input is trimmed and upper-cased; anything other than exactly three
    /// ASCII letters is rejected.
    pub fn new(code: &str) -> Result<Self, WalletError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(WalletError::InvalidCurrency(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Wallet status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Suspended,
    Closed,
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletStatus::Active => write!(f, "active"),
            WalletStatus::Suspended => write!(f, "suspended"),
            WalletStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for WalletStatus {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WalletStatus::Active),
            "suspended" => Ok(WalletStatus::Suspended),
            "closed" => Ok(WalletStatus::Closed),
            other => Err(WalletError::CorruptRecord(format!(
                "unknown wallet status '{other}'"
            ))),
        }
    }
}

/// Wallet model
///
/// `balance` is held in the currency's minor units and is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: i64,
    pub currency: Currency,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// Item identifier as sent by clients; either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// A single line of a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub item_id: ItemId,
    pub cost: i64,
}

/// Purchase status. Failed attempts are never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Completed,
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PurchaseStatus::Completed),
            other => Err(WalletError::CorruptRecord(format!(
                "unknown purchase status '{other}'"
            ))),
        }
    }
}

/// Purchase record (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub items: Vec<PurchaseItem>,
    pub total_cost: i64,
    pub currency: Currency,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

/// Purchase record about to be inserted
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub items: Vec<PurchaseItem>,
    pub total_cost: i64,
    pub currency: Currency,
}

/// Result of a successful purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub purchase_id: PurchaseId,
    pub total_cost: i64,
    pub currency: Currency,
    pub new_balance: i64,
}

/// Sum item costs, rejecting empty lists, negative costs and overflow.
pub fn total_cost(items: &[PurchaseItem]) -> Result<i64, WalletError> {
    if items.is_empty() {
        return Err(WalletError::EmptyPurchase);
    }

    items.iter().try_fold(0i64, |sum, item| {
        if item.cost < 0 {
            return Err(WalletError::InvalidItemCost {
                item_id: item.item_id.to_string(),
                cost: item.cost,
            });
        }
        sum.checked_add(item.cost).ok_or(WalletError::BalanceOverflow)
    })
}
