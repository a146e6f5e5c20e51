//! Catalog API handlers.
//!
//! Public, read-only endpoints over the catalog database.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use storefront::catalog::{Actor, CatalogError, Film, Page};

use super::{AppState, NoteResponse, note};

type ErrorResponse = (StatusCode, Json<NoteResponse>);

/// `GET /api/catalog/films?limit=&offset=`
pub async fn list_films(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Film>>, ErrorResponse> {
    state
        .catalog
        .list_films(page)
        .await
        .map(Json)
        .map_err(|e| catalog_error(&e))
}

/// `GET /api/catalog/films/{id}`
pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Film>, ErrorResponse> {
    state
        .catalog
        .get_film(id)
        .await
        .map(Json)
        .map_err(|e| catalog_error(&e))
}

/// `GET /api/catalog/actors?limit=&offset=`
pub async fn list_actors(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Actor>>, ErrorResponse> {
    state
        .catalog
        .list_actors(page)
        .await
        .map(Json)
        .map_err(|e| catalog_error(&e))
}

/// `GET /api/catalog/actors/{id}`
pub async fn get_actor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Actor>, ErrorResponse> {
    state
        .catalog
        .get_actor(id)
        .await
        .map(Json)
        .map_err(|e| catalog_error(&e))
}

fn catalog_error(e: &CatalogError) -> ErrorResponse {
    let status = match e {
        CatalogError::FilmNotFound(_) | CatalogError::ActorNotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Database(err) => {
            tracing::error!("Catalog query failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    note(status, e.client_message())
}
