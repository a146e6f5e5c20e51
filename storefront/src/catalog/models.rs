//! Catalog data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Film row from the catalog store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub film_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub rental_rate: f64,
    pub length: Option<i32>,
    pub rating: Option<String>,
}

/// Actor row from the catalog store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub last_update: DateTime<Utc>,
}

/// Paging window for list reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default = "Page::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Page {
    /// Largest page a caller may request
    pub const MAX_LIMIT: i64 = 200;

    fn default_limit() -> i64 {
        50
    }

    /// Clamp limit to `1..=MAX_LIMIT` and offset to be non-negative
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::default_limit(),
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamping() {
        let page = Page { limit: 10_000, offset: -5 }.clamped();
        assert_eq!(page, Page { limit: 200, offset: 0 });

        let page = Page { limit: 0, offset: 3 }.clamped();
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 3);
    }

    #[test]
    fn test_page_defaults_from_empty_query() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_film_serializes_camel_case() {
        let film = Film {
            film_id: 1,
            title: "ACADEMY DINOSAUR".to_string(),
            description: None,
            release_year: Some(2006),
            rental_rate: 0.99,
            length: Some(86),
            rating: Some("PG".to_string()),
        };
        let json = serde_json::to_value(&film).unwrap();
        assert_eq!(json["filmId"], 1);
        assert_eq!(json["releaseYear"], 2006);
    }
}
