//! kpa-adapter library interface
//!
//! Remote karaoke catalog adapter: loads the catalog list once, resolves
//! songs on demand into locally cached parsed entries and answers searches.
//! The HTTP routes expose the search capability to a host.

pub mod api;
pub mod catalog;
pub mod error;
pub mod lifecycle;

pub use crate::error::{ApiError, ApiResult};
pub use crate::lifecycle::{AdapterConfig, KaraokeProviderAdapter, SongRepository};

use axum::Router;
use chrono::{DateTime, Utc};
use kpa_common::config::TomlConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<KaraokeProviderAdapter>,
    /// Persisted settings; edits apply on the next adapter load
    pub settings: Arc<RwLock<TomlConfig>>,
    /// TOML file settings are written back to, if any
    pub config_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        adapter: Arc<KaraokeProviderAdapter>,
        settings: TomlConfig,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            adapter,
            settings: Arc::new(RwLock::new(settings)),
            config_path,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::song_routes())
        .merge(api::settings_routes())
        .merge(api::event_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
