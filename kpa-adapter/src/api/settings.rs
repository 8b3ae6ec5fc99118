//! Settings API endpoint
//!
//! The catalog URL is the one user-editable setting. Changes are persisted to
//! the TOML file and take effect on the next adapter load; the running
//! session keeps the catalog it loaded.

use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::get, Json, Router};
use kpa_common::config::{is_valid_catalog_url, write_toml_config};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    /// Persisted catalog URL (used on next load)
    pub catalog_url: String,
    /// Catalog URL of the running adapter
    pub active_catalog_url: String,
    /// True when the persisted URL differs from the running one
    pub restart_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub catalog_url: String,
}

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let catalog_url = state.settings.read().await.catalog_url.clone();
    Json(settings_response(&state, catalog_url))
}

/// PUT /settings
///
/// **Request:** `{"catalog_url": "http://host:8080/songs"}`
///
/// **Errors:**
/// - 400 Bad Request: URL is empty or not http/https
/// - 500 Internal Server Error: TOML file could not be written
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    if !is_valid_catalog_url(&payload.catalog_url) {
        return Err(ApiError::BadRequest(format!(
            "Catalog URL must start with http:// or https://, got '{}'",
            payload.catalog_url
        )));
    }
    let catalog_url = payload.catalog_url.trim().to_string();

    let mut settings = state.settings.write().await;
    let mut updated = settings.clone();
    updated.catalog_url = catalog_url.clone();

    match &state.config_path {
        Some(path) => {
            write_toml_config(&updated, path)?;
            info!("Catalog URL set to {} (saved to {})", catalog_url, path.display());
        }
        None => warn!("Catalog URL set to {} but no config file to persist it", catalog_url),
    }
    *settings = updated;

    Ok(Json(settings_response(&state, catalog_url)))
}

fn settings_response(state: &AppState, catalog_url: String) -> SettingsResponse {
    let active_catalog_url = state.adapter.catalog_url().to_string();
    SettingsResponse {
        restart_required: catalog_url != active_catalog_url,
        catalog_url,
        active_catalog_url,
    }
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
