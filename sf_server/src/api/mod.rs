//! HTTP API for the storefront server.
//!
//! # Modules
//!
//! - [`purchase`]: Wallet-debiting purchases
//! - [`wallet`]: Fund additions, wallet info and purchase history
//! - [`users`]: Signup, login and profile management
//! - [`catalog`]: Public film/actor reads from the catalog store
//! - [`middleware`]: Authentication middleware for protected endpoints
//! - [`request_id`]: Request correlation and request metrics
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/users/signup` - Register new user
//! - `POST /api/users/login` - Login with email and password
//! - `GET /api/catalog/films`, `/api/catalog/films/{id}` - Films
//! - `GET /api/catalog/actors`, `/api/catalog/actors/{id}` - Actors
//! - `GET /health` - Server health status
//!
//! ## Requires `Authorization: Bearer <jwt>`
//! - `POST /purchase/purchaseitems` - Buy items with the wallet balance
//! - `POST /api/wallet/addFunds` - Credit the wallet
//! - `GET /api/wallet/getWalletinfo` - Current wallet row
//! - `GET /api/wallet/purchases` - Purchase history, newest first
//! - `GET /api/users/getuserinfo?email=` - Look up a user
//! - `PUT /api/users/updateuserinfo/{id}` - Change own username/email
//! - `DELETE /api/users/deleteuserinfo/{id}` - Delete own account
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod catalog;
pub mod middleware;
pub mod purchase;
pub mod request_id;
pub mod users;
pub mod wallet;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use storefront::{
    auth::AuthManager, catalog::CatalogRepository, db::Database, wallet::WalletManager,
};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub wallet_manager: Arc<WalletManager>,
    pub catalog: Arc<CatalogRepository>,
    /// Users/wallets store, checked by `/health`
    pub database: Database,
}

/// `{"ServerNote": "..."}` body used by the wallet and user endpoints
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
}

/// Build an error response with a `ServerNote` body
pub fn note(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<NoteResponse>) {
    (
        status,
        Json(NoteResponse {
            server_note: message.into(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/users/signup", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route("/api/catalog/films", get(catalog::list_films))
        .route("/api/catalog/films/{id}", get(catalog::get_film))
        .route("/api/catalog/actors", get(catalog::list_actors))
        .route("/api/catalog/actors/{id}", get(catalog::get_actor));

    let protected_routes = Router::new()
        .route("/purchase/purchaseitems", post(purchase::purchase_items))
        .route("/api/wallet/addFunds", post(wallet::add_funds))
        .route("/api/wallet/getWalletinfo", get(wallet::get_wallet_info))
        .route("/api/wallet/purchases", get(wallet::purchase_history))
        .route("/api/users/getuserinfo", get(users::get_user_info))
        .route("/api/users/updateuserinfo/{id}", put(users::update_user_info))
        .route("/api/users/deleteuserinfo/{id}", delete(users::delete_user_info))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if both stores answer, or `503 Service Unavailable` if
/// either fails.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","database":true,"catalog":true,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (db_check, catalog_check) =
        tokio::join!(state.database.health_check(), state.catalog.health_check());
    if let Err(e) = &db_check {
        log::warn!("Health check: database unreachable: {e}");
    }
    if let Err(e) = &catalog_check {
        log::warn!("Health check: catalog unreachable: {e}");
    }
    let db_healthy = db_check.is_ok();
    let catalog_healthy = catalog_check.is_ok();

    crate::metrics::db_connections_active("main", state.database.pool().size());
    crate::metrics::db_connections_active("catalog", state.catalog.pool_size());

    let overall_healthy = db_healthy && catalog_healthy;

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if overall_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "catalog": catalog_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
