//! Catalog module: raw reads from the film/actor store.
//!
//! The catalog lives in its own database with its own pool; nothing here
//! writes or joins against the wallet store.

pub mod errors;
pub mod models;
pub mod repository;

pub use errors::{CatalogError, CatalogResult};
pub use models::{Actor, Film, Page};
pub use repository::CatalogRepository;
