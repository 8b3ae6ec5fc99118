//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok", or "unloaded" after shutdown started)
    pub status: String,
    /// Module name ("kpa-adapter")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Whether the bulk catalog fetch has completed
    pub catalog_ready: bool,
    /// Number of catalog records
    pub song_count: usize,
    /// Number of resolved songs in the cache
    pub cached_count: usize,
    /// Catalog base URL in use
    pub catalog_url: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let adapter = &state.adapter;

    let status = if adapter.is_unloaded() { "unloaded" } else { "ok" };

    Json(HealthResponse {
        status: status.to_string(),
        module: "kpa-adapter".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        catalog_ready: adapter.snapshot().is_ready(),
        song_count: adapter.snapshot().len(),
        cached_count: adapter.cache().len().await,
        catalog_url: adapter.catalog_url().to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
