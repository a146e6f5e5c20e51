//! Wallet API handlers.
//!
//! All endpoints act on the authenticated caller's own wallet.

use axum::{
    Json,
    extract::{Extension, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use storefront::wallet::{Currency, PurchaseRecord, UserId, Wallet, WalletError};

use super::{AppState, NoteResponse, note};
use crate::metrics;

/// Default number of history entries when `limit` is absent
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct AddFundsPayload {
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFundsResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub new_balance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfoResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub wallet_info: Wallet,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub purchases: Vec<PurchaseRecord>,
}

type ErrorResponse = (StatusCode, Json<NoteResponse>);

/// Credit the caller's wallet.
///
/// # Request Body
///
/// ```json
/// { "amount": 500, "currency": "USD" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: non-positive amount, bad currency, currency mismatch
/// - `403 Forbidden`: wallet suspended or closed
/// - `404 Not Found`: caller has no wallet
/// - `500 Internal Server Error`: store failure or timeout
pub async fn add_funds(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    payload: Result<Json<AddFundsPayload>, JsonRejection>,
) -> Result<Json<AddFundsResponse>, ErrorResponse> {
    let Json(payload) = payload.map_err(|rejection| {
        metrics::funds_added_total("InvalidRequest");
        note(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    let result = match payload.currency.as_deref().map(Currency::new).transpose() {
        Ok(currency) => {
            state
                .wallet_manager
                .add_funds(user_id, payload.amount, currency)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(new_balance) => {
            metrics::funds_added_total("success");
            Ok(Json(AddFundsResponse {
                server_note: "Funds added successfully!".to_string(),
                new_balance,
            }))
        }
        Err(e) => {
            metrics::funds_added_total(e.reason_code());
            Err(wallet_error(&e))
        }
    }
}

/// Return the caller's wallet row.
pub async fn get_wallet_info(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<WalletInfoResponse>, ErrorResponse> {
    let wallet = state
        .wallet_manager
        .get_wallet(user_id)
        .await
        .map_err(|e| wallet_error(&e))?;

    Ok(Json(WalletInfoResponse {
        server_note: "Wallet info fetched!".to_string(),
        wallet_info: wallet,
    }))
}

/// Return the caller's purchases, newest first.
pub async fn purchase_history(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ErrorResponse> {
    let purchases = state
        .wallet_manager
        .purchase_history(user_id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await
        .map_err(|e| wallet_error(&e))?;

    Ok(Json(HistoryResponse {
        server_note: "Purchase history fetched!".to_string(),
        purchases,
    }))
}

fn wallet_error(e: &WalletError) -> ErrorResponse {
    let status = match e {
        WalletError::WalletNotFound(_) => StatusCode::NOT_FOUND,
        WalletError::WalletInactive(_) => StatusCode::FORBIDDEN,
        WalletError::InvalidAmount(_)
        | WalletError::InvalidCurrency(_)
        | WalletError::CurrencyMismatch { .. }
        | WalletError::BalanceOverflow
        | WalletError::EmptyPurchase
        | WalletError::InvalidItemCost { .. }
        | WalletError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
        WalletError::Database(_)
        | WalletError::Storage(_)
        | WalletError::Timeout(_)
        | WalletError::CorruptRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    note(status, e.client_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront::wallet::WalletStatus;

    #[test]
    fn test_wallet_error_statuses() {
        assert_eq!(wallet_error(&WalletError::WalletNotFound(1)).0, StatusCode::NOT_FOUND);
        assert_eq!(
            wallet_error(&WalletError::WalletInactive(WalletStatus::Closed)).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(wallet_error(&WalletError::InvalidAmount(0)).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            wallet_error(&WalletError::Storage("disk".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_infrastructure_detail_is_hidden() {
        let (_, Json(body)) = wallet_error(&WalletError::Storage("secret detail".to_string()));
        assert_eq!(body.server_note, "Internal server error");
    }
}
