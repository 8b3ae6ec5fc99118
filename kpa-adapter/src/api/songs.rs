//! Song search endpoints
//!
//! `GET /songs/search?q=` runs a search and returns every resolved match;
//! `GET /songs/:song_id` returns an already resolved song.

use crate::catalog::ResolvedEntry;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search text matched against title and artist
    pub q: Option<String>,
}

/// GET /songs/search?q=<text>
///
/// Always 200: an unloaded catalog, an empty query or unresolvable matches
/// just shrink the result list.
pub async fn search_songs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ResolvedEntry>> {
    let results = state.adapter.search(params.q.as_deref()).await;
    Json(results.iter().map(|entry| entry.as_ref().clone()).collect())
}

/// GET /songs/:song_id
pub async fn get_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> ApiResult<Json<ResolvedEntry>> {
    state
        .adapter
        .cache()
        .get(&song_id)
        .await
        .map(|entry| Json(entry.as_ref().clone()))
        .ok_or_else(|| ApiError::NotFound(format!("Song {} is not resolved", song_id)))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs/search", get(search_songs))
        .route("/songs/:song_id", get(get_song))
}
