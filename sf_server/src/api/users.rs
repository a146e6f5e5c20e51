//! User API handlers.
//!
//! # Examples
//!
//! Sign up:
//! ```bash
//! curl -X POST http://localhost:3000/api/users/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "shopper1", "email": "shopper@example.com", "password": "Pass1234"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/api/users/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "shopper@example.com", "password": "Pass1234"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use storefront::auth::{
    AuthError, LoginRequest, SignupRequest, UpdateUserRequest, User, UserId,
};

use super::{AppState, NoteResponse, note};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub user_id: UserId,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    #[serde(rename = "ServerNote")]
    pub server_note: String,
    pub data: User,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

type ErrorResponse = (StatusCode, Json<NoteResponse>);

fn bad_body(rejection: JsonRejection) -> ErrorResponse {
    note(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Register a new user; an empty wallet is created alongside.
///
/// # Errors
///
/// - `400 Bad Request`: invalid input, username or email taken
/// - `500 Internal Server Error`: store failure
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ErrorResponse> {
    let Json(request) = payload.map_err(bad_body)?;

    let user = state
        .auth_manager
        .signup(request)
        .await
        .map_err(|e| auth_error(&e))?;

    metrics::signups_total();
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            server_note: "User registered successfully!".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Exchange email and password for an access token.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let Json(request) = payload.map_err(bad_body)?;

    match state.auth_manager.login(request).await {
        Ok((user, token)) => {
            metrics::login_attempts_total(true);
            Ok(Json(LoginResponse {
                server_note: "Login successful!".to_string(),
                user_id: user.id,
                token,
            }))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if matches!(e, AuthError::InvalidCredentials) {
                log_security_event("failed_login", None, "Invalid email or password");
            }
            Err(auth_error(&e))
        }
    }
}

/// Look up a user by email.
pub async fn get_user_info(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserInfoResponse>, ErrorResponse> {
    let user = state
        .auth_manager
        .find_by_email(&query.email)
        .await
        .map_err(|e| auth_error(&e))?;

    Ok(Json(UserInfoResponse {
        server_note: "User info fetched!".to_string(),
        data: user,
    }))
}

/// Change the caller's own username and email.
///
/// # Errors
///
/// - `403 Forbidden`: `id` is not the caller
/// - `400 Bad Request`: invalid input, username or email taken
/// - `404 Not Found`: user no longer exists
pub async fn update_user_info(
    State(state): State<AppState>,
    Extension(caller): Extension<UserId>,
    Path(id): Path<UserId>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<StatusCode, ErrorResponse> {
    ensure_self(caller, id)?;
    let Json(request) = payload.map_err(bad_body)?;

    state
        .auth_manager
        .update_user(id, request)
        .await
        .map_err(|e| auth_error(&e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the caller's own account together with its wallet.
pub async fn delete_user_info(
    State(state): State<AppState>,
    Extension(caller): Extension<UserId>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ErrorResponse> {
    ensure_self(caller, id)?;

    state
        .auth_manager
        .delete_user(id)
        .await
        .map_err(|e| auth_error(&e))?;

    Ok(StatusCode::NO_CONTENT)
}

fn ensure_self(caller: UserId, target: UserId) -> Result<(), ErrorResponse> {
    if caller == target {
        Ok(())
    } else {
        log_security_event(
            "cross_account_access",
            Some(caller),
            &format!("attempted to modify user {target}"),
        );
        Err(note(
            StatusCode::FORBIDDEN,
            "You can only modify your own account",
        ))
    }
}

fn auth_error(e: &AuthError) -> ErrorResponse {
    let status = match e {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::JwtError(_) => StatusCode::FORBIDDEN,
        _ if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!("User operation failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    note(status, e.client_message())
}
