//! Catalog error types.

use thiserror::Error;

/// Catalog read errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Film not found
    #[error("Film {0} not found")]
    FilmNotFound(i32),

    /// Actor not found
    #[error("Actor {0} not found")]
    ActorNotFound(i32),
}

impl CatalogError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            CatalogError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
