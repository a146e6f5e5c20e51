//! Authentication error types.

use thiserror::Error;

use crate::wallet::WalletError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Wallet provisioning failed during signup
    #[error("Wallet provisioning failed: {0}")]
    Wallet(#[from] WalletError),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Email or password did not match
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Invalid email format
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and JWT errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::Wallet(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
            AuthError::JwtError(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the failure is the caller's fault
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::Database(_)
                | AuthError::Wallet(_)
                | AuthError::HashingFailed
                | AuthError::JwtError(_)
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
