//! Authentication module providing user registration, login, and access tokens.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - HS256 JWT access tokens (60-minute default expiry)
//! - Wallet provisioning in the same transaction as signup
//!
//! ## Example
//!
//! ```no_run
//! use storefront::auth::{AuthManager, SignupRequest};
//! use storefront::db::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(db.pool().clone()),
//!         "secret_pepper".to_string(),
//!         "jwt_secret".to_string()
//!     );
//!
//!     let request = SignupRequest {
//!         username: "shopper1".to_string(),
//!         email: "shopper@example.com".to_string(),
//!         password: "SecurePass123".to_string(),
//!     };
//!
//!     let user = auth.signup(request).await?;
//!     println!("Registered user: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::{
    AuthManager, DEFAULT_ACCESS_TOKEN_TTL_MINUTES, validate_email, validate_password,
    validate_username,
};
pub use models::{
    AccessTokenClaims, LoginRequest, SignupRequest, UpdateUserRequest, User, UserId,
};
