//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{net::SocketAddr, time::Duration};
use storefront::{
    db::DatabaseConfig,
    wallet::{Currency, WalletConfig},
};

const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Longest accepted access token lifetime (30 days)
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 43_200;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Users/wallets database configuration
    pub database: DatabaseConfig,
    /// Catalog database; `None` shares the users/wallets pool
    pub catalog_database: Option<DatabaseConfig>,
    /// Security configuration
    pub security: SecurityConfig,
    /// Wallet behaviour
    pub wallet: WalletSettings,
    /// Optional Prometheus listener
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: i64,
}

/// Wallet settings
#[derive(Debug, Clone)]
pub struct WalletSettings {
    /// Currency used for purchases that name none, and for new wallets
    pub default_currency: Currency,
    /// Upper bound on one purchase or fund-addition transaction
    pub transaction_timeout_secs: u64,
}

impl SecurityConfig {
    /// Access token lifetime, rejecting values outside `1..=MAX_ACCESS_TOKEN_TTL_MINUTES`
    pub fn access_token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let minutes = self.access_token_ttl_minutes;
        if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&minutes) {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_MINUTES".to_string(),
                reason: format!("Must be between 1 and {MAX_ACCESS_TOKEN_TTL_MINUTES}"),
            });
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
            var: "ACCESS_TOKEN_TTL_MINUTES".to_string(),
            reason: format!("{minutes} minutes is out of range"),
        })
    }
}

impl WalletSettings {
    pub fn to_wallet_config(&self) -> WalletConfig {
        WalletConfig {
            default_currency: self.default_currency.clone(),
            transaction_timeout: Duration::from_secs(self.transaction_timeout_secs),
        }
    }
}

/// Command-line overrides that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub catalog_database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_addr(
                "SERVER_BIND",
                &lookup("SERVER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            )?,
        };

        let mut database = DatabaseConfig::from_lookup("DATABASE_URL", &lookup);
        if let Some(url) = overrides.database_url {
            database.database_url = url;
        }

        let catalog_database = overrides
            .catalog_database_url
            .or_else(|| lookup("CATALOG_DATABASE_URL"))
            .map(|url| database.with_url(url));

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            access_token_ttl_minutes: parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 60),
        };

        let default_currency = match lookup("DEFAULT_CURRENCY") {
            Some(code) => Currency::new(&code).map_err(|_| ConfigError::Invalid {
                var: "DEFAULT_CURRENCY".to_string(),
                reason: format!("'{code}' is not a three-letter currency code"),
            })?,
            None => Currency::default(),
        };

        let wallet = WalletSettings {
            default_currency,
            transaction_timeout_secs: parse_or(&lookup, "WALLET_TX_TIMEOUT_SECS", 10),
        };

        let metrics_bind = lookup("METRICS_BIND")
            .map(|addr| parse_addr("METRICS_BIND", &addr))
            .transpose()?;

        Ok(ServerConfig {
            bind,
            database,
            catalog_database,
            security,
            wallet,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.transaction_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "WALLET_TX_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.security.access_token_ttl()?;

        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_addr(var: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("'{value}' is not an IP:PORT address"),
    })
}

/// Helper to parse a variable with default fallback
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
