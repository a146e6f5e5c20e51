//! Purchase API handler.
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:3000/purchase/purchaseitems \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"items": [{"itemId": 1, "cost": 15}, {"itemId": "sku-2", "cost": 25}]}'
//! ```

use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use storefront::wallet::{
    Currency, ErrorKind, PurchaseId, PurchaseItem, UserId, WalletError,
};

use super::AppState;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct PurchasePayload {
    pub items: Vec<PurchaseItem>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub success: bool,
    pub new_balance: i64,
    pub purchase_id: PurchaseId,
    pub total_cost: i64,
    pub currency: Currency,
}

#[derive(Debug, Serialize)]
pub struct PurchaseFailure {
    pub success: bool,
    pub error: String,
    pub reason: String,
}

type FailureResponse = (StatusCode, Json<PurchaseFailure>);

fn failure(status: StatusCode, error: impl Into<String>, reason: &str) -> FailureResponse {
    (
        status,
        Json(PurchaseFailure {
            success: false,
            error: error.into(),
            reason: reason.to_string(),
        }),
    )
}

/// Debit the caller's wallet for the requested items.
///
/// # Request Body
///
/// ```json
/// { "items": [{ "itemId": 1, "cost": 40 }], "currency": "USD" }
/// ```
///
/// `currency` is optional. Costs are integer minor units.
///
/// # Response
///
/// `200 OK`:
/// ```json
/// { "success": true, "newBalance": 60, "purchaseId": 7, "totalCost": 40, "currency": "USD" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed body, invalid items or currency, missing or
///   inactive wallet, currency mismatch, insufficient funds
/// - `500 Internal Server Error`: store failure or timeout; nothing was changed
pub async fn purchase_items(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    payload: Result<Json<PurchasePayload>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, FailureResponse> {
    let Json(payload) = payload.map_err(|rejection| {
        metrics::purchases_total("InvalidRequest");
        failure(
            StatusCode::BAD_REQUEST,
            rejection.body_text(),
            "InvalidRequest",
        )
    })?;

    let result = match payload.currency.as_deref().map(Currency::new).transpose() {
        Ok(currency) => {
            state
                .wallet_manager
                .attempt_purchase(user_id, payload.items, currency)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(receipt) => {
            metrics::purchases_total("success");
            Ok(Json(PurchaseResponse {
                success: true,
                new_balance: receipt.new_balance,
                purchase_id: receipt.purchase_id,
                total_cost: receipt.total_cost,
                currency: receipt.currency,
            }))
        }
        Err(e) => {
            metrics::purchases_total(e.reason_code());
            Err(purchase_error(&e))
        }
    }
}

fn purchase_error(e: &WalletError) -> FailureResponse {
    let status = match e.kind() {
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Validation | ErrorKind::BusinessRule => StatusCode::BAD_REQUEST,
    };
    failure(status, e.client_message(), e.reason_code())
}
