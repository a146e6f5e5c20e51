//! Database configuration module.
//!
//! Both stores share the pool tuning variables; only the URL variable differs.

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration for the users/wallets store from the process environment
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (default: development URL)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 2)
    /// - `DB_CONNECTION_TIMEOUT_SECS`: Acquire timeout (default: 5)
    /// - `DB_IDLE_TIMEOUT_SECS`: Idle timeout (default: 300)
    /// - `DB_MAX_LIFETIME_SECS`: Max lifetime (default: 1800)
    pub fn from_env() -> Self {
        Self::from_lookup("DATABASE_URL", |key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// `url_var` names the variable holding the connection URL; unset or
    /// unparsable pool settings fall back to the development defaults.
    pub fn from_lookup<F>(url_var: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::development();
        let parse_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };
        let parse_u32_or = |key: &str, default: u32| {
            lookup(key)
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };

        Self {
            database_url: lookup(url_var).unwrap_or(defaults.database_url),
            max_connections: parse_u32_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_u32_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    /// Same pool settings, different database
    pub fn with_url(&self, database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..self.clone()
        }
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/storefront` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/storefront".to_string(),
            max_connections: 20,
            min_connections: 2,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}
