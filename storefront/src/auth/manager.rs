//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, LoginRequest, SignupRequest, UpdateUserRequest, User, UserId},
};
use crate::{db::repository::insert_wallet, wallet::Currency};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::sync::Arc;

/// Default access token lifetime in minutes
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    pool: Arc<PgPool>,
    pepper: String,
    jwt_secret: String,
    access_token_duration: Duration,
    wallet_currency: Currency,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Users/wallets database pool
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(pool: Arc<PgPool>, pepper: String, jwt_secret: String) -> Self {
        Self {
            pool,
            pepper,
            jwt_secret,
            access_token_duration: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            wallet_currency: Currency::default(),
        }
    }

    /// Override the access token lifetime
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_duration = ttl;
        self
    }

    /// Currency of wallets provisioned at signup
    pub fn with_wallet_currency(mut self, currency: Currency) -> Self {
        self.wallet_currency = currency;
        self
    }

    /// Register a new user and provision an empty wallet
    ///
    /// The user row and the wallet row are written in one transaction.
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` / `AuthError::EmailTaken` - Already registered
    /// * `AuthError::InvalidUsername` / `InvalidEmail` / `WeakPassword` - Rejected input
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let mut tx = self.pool.begin().await?;

        let existing_user = sqlx::query("SELECT id FROM users WHERE username = $1")
            .bind(&request.username)
            .fetch_optional(&mut *tx)
            .await?;
        if existing_user.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let existing_email = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&mut *tx)
            .await?;
        if existing_email.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(&request.password)?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_error)?;
        let user = user_from_row(&row)?;

        insert_wallet(&mut *tx, user.id, &self.wallet_currency).await?;
        tx.commit().await?;

        log::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Check credentials and issue an access token
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(&request.email)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let password_hash: String = row.try_get("password_hash")?;
        self.verify_password(&request.password, &password_hash)?;

        let user = user_from_row(&row)?;
        let token = self.issue_access_token(user.id, &user.username)?;

        Ok((user, token))
    }

    /// Look up a user by email
    pub async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user_from_row(&row)
    }

    /// Change username and email
    pub async fn update_user(&self, user_id: UserId, request: UpdateUserRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;

        let conflict = sqlx::query(
            "SELECT username = $1 AS same_username FROM users
             WHERE (username = $1 OR email = $2) AND id <> $3
             LIMIT 1",
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        if let Some(row) = conflict {
            return Err(if row.try_get::<bool, _>("same_username")? {
                AuthError::UsernameTaken
            } else {
                AuthError::EmailTaken
            });
        }

        let row = sqlx::query(
            "UPDATE users SET username = $1, email = $2 WHERE id = $3
             RETURNING id, username, email, created_at",
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(conflict_error)?
        .ok_or(AuthError::UserNotFound)?;

        user_from_row(&row)
    }

    /// Delete a user; the wallet and purchase history cascade with it
    pub async fn delete_user(&self, user_id: UserId) -> AuthResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        log::info!("Deleted user {user_id}");
        Ok(())
    }

    /// Verify access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Issue a signed access token for `user_id`
    pub fn issue_access_token(&self, user_id: UserId, username: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Map a `users` unique-constraint violation to the matching taken error
///
/// The pre-insert lookups can race with a concurrent signup or update.
fn conflict_error(err: sqlx::Error) -> AuthError {
    let taken = match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            db_err.constraint().and_then(|name| {
                if name.contains("username") {
                    Some(AuthError::UsernameTaken)
                } else if name.contains("email") {
                    Some(AuthError::EmailTaken)
                } else {
                    None
                }
            })
        }
        _ => None,
    };
    taken.unwrap_or(AuthError::Database(err))
}

fn user_from_row(row: &PgRow) -> AuthResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
    })
}

/// Validate username format
pub fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(AuthError::InvalidUsername(
            "Username must be 3-32 characters".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, underscores and dashes".to_string(),
        ));
    }

    Ok(())
}

/// Validate email shape (local part, `@`, dotted domain)
pub fn validate_email(email: &str) -> AuthResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid && email.len() <= 254 && !email.chars().any(char::is_whitespace) {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    if !has_digit || !has_letter {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one letter and one number".to_string(),
        ));
    }

    Ok(())
}
