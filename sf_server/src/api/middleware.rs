//! Authentication middleware for protected endpoints.
//!
//! Extracts and validates the JWT access token from the Authorization header,
//! then injects the authenticated user ID into request extensions for
//! downstream handlers.
//!
//! # Extracting User ID
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use storefront::wallet::UserId;
//!
//! async fn protected_handler(Extension(user_id): Extension<UserId>) -> String {
//!     format!("Authenticated as user {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::{AppState, NoteResponse, note};
use crate::logging::log_security_event;

/// Authentication middleware that validates JWT tokens and injects user ID.
///
/// # Behavior
///
/// - **Success**: Token valid → Injects `UserId` into request extensions → Calls next handler
/// - **Missing header / not a bearer token**: Returns `401 Unauthorized`
/// - **Invalid/expired token**: Returns `403 Forbidden`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<NoteResponse>)> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return Err(note(
            StatusCode::UNAUTHORIZED,
            "Access denied. No token provided!",
        ));
    };

    match state.auth_manager.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            Ok(next.run(request).await)
        }
        Err(e) => {
            log_security_event("invalid_token", None, &e.to_string());
            Err(note(StatusCode::FORBIDDEN, "Invalid token"))
        }
    }
}
