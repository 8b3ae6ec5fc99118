//! Adapter lifecycle
//!
//! Owns the catalog state of one adapter instance (snapshot, resolution cache,
//! in-flight resolutions), triggers the one bulk fetch on load and exposes the
//! search engine to the host as a [`SongRepository`].

use crate::catalog::{
    CatalogClient, CatalogSnapshot, ResolutionCache, ResolvedEntry, Resolver, SearchEngine,
    SnapshotError, SongParser,
};
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use kpa_common::config::{TomlConfig, DEFAULT_MAX_CONCURRENT_RESOLUTIONS};
use kpa_common::events::{AdapterEvent, EventBus};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Song search capability offered to the host
pub trait SongRepository: Send + Sync {
    /// Lazily delivered search results; empty for an empty query or before
    /// the catalog has loaded
    fn search_songs(&self, query: Option<&str>) -> BoxStream<'static, Arc<ResolvedEntry>>;
}

/// Settings the adapter is created with
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Catalog base URL; the bulk list lives here and links are relative to it
    pub catalog_url: String,
    /// Folder receiving downloaded song files
    pub songs_folder: PathBuf,
    pub max_concurrent_resolutions: usize,
}

impl AdapterConfig {
    pub fn new(catalog_url: impl Into<String>, songs_folder: PathBuf) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            songs_folder,
            max_concurrent_resolutions: DEFAULT_MAX_CONCURRENT_RESOLUTIONS,
        }
    }

    pub fn from_toml(catalog_url: String, songs_folder: PathBuf, toml_config: &TomlConfig) -> Self {
        Self {
            catalog_url,
            songs_folder,
            max_concurrent_resolutions: toml_config.max_concurrent_resolutions,
        }
    }
}

pub struct KaraokeProviderAdapter {
    config: AdapterConfig,
    client: Arc<dyn CatalogClient>,
    snapshot: Arc<CatalogSnapshot>,
    search: SearchEngine,
    event_bus: EventBus,
    shutdown: CancellationToken,
    load_started: AtomicBool,
    bulk_task: Mutex<Option<JoinHandle<()>>>,
}

impl KaraokeProviderAdapter {
    pub fn new(
        config: AdapterConfig,
        client: Arc<dyn CatalogClient>,
        parser: Arc<dyn SongParser>,
        event_bus: EventBus,
    ) -> Self {
        let snapshot = Arc::new(CatalogSnapshot::new());
        let resolver = Resolver::new(
            config.catalog_url.clone(),
            config.songs_folder.clone(),
            Arc::clone(&client),
            parser,
            Arc::new(ResolutionCache::new()),
            Some(event_bus.clone()),
        );
        let search = SearchEngine::new(
            Arc::clone(&snapshot),
            resolver,
            config.max_concurrent_resolutions,
        );

        Self {
            config,
            client,
            snapshot,
            search,
            event_bus,
            shutdown: CancellationToken::new(),
            load_started: AtomicBool::new(false),
            bulk_task: Mutex::new(None),
        }
    }

    /// Start the bulk catalog fetch
    ///
    /// Only the first call has an effect; returns false for repeated calls.
    /// Completion is observed asynchronously and installs the snapshot.
    pub async fn on_load(&self) -> bool {
        if self.load_started.swap(true, Ordering::SeqCst) {
            debug!("on_load already called, catalog fetch not repeated");
            return false;
        }

        info!("KaraokeProviderAdapter.on_load");
        info!("Getting KaraokeProvider songs from {}", self.config.catalog_url);

        let client = Arc::clone(&self.client);
        let snapshot = Arc::clone(&self.snapshot);
        let event_bus = self.event_bus.clone();
        let shutdown = self.shutdown.clone();
        let catalog_url = self.config.catalog_url.clone();

        let handle = tokio::spawn(async move {
            let response = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Catalog fetch abandoned, adapter unloaded");
                    return;
                }
                response = client.fetch_bulk(&catalog_url) => response,
            };

            match response {
                Ok(body) => install_catalog(&snapshot, &event_bus, &body),
                Err(e) => {
                    error!(
                        url = %catalog_url,
                        error = %e,
                        "Getting song metas failed; search stays empty for this session"
                    );
                    event_bus.emit_lossy(AdapterEvent::CatalogLoadFailed {
                        reason: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        });

        *self.bulk_task.lock().await = Some(handle);
        true
    }

    /// Stop pending work and release the bulk fetch task
    ///
    /// The resolution cache is kept; it lives until the adapter is dropped.
    pub async fn on_unload(&self) {
        info!("KaraokeProviderAdapter.on_unload");
        self.shutdown.cancel();

        if let Some(handle) = self.bulk_task.lock().await.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }

        self.event_bus.emit_lossy(AdapterEvent::AdapterUnloaded {
            timestamp: Utc::now(),
        });
    }

    pub fn is_unloaded(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Run a search to completion
    pub async fn search(&self, query: Option<&str>) -> Vec<Arc<ResolvedEntry>> {
        if self.is_unloaded() {
            return Vec::new();
        }
        self.search.search(query, &self.shutdown.child_token()).await
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn cache(&self) -> &ResolutionCache {
        self.search.resolver().cache()
    }

    pub fn resolver(&self) -> &Resolver {
        self.search.resolver()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

impl SongRepository for KaraokeProviderAdapter {
    fn search_songs(&self, query: Option<&str>) -> BoxStream<'static, Arc<ResolvedEntry>> {
        if self.is_unloaded() {
            return stream::empty().boxed();
        }
        self.search.search_stream(query, self.shutdown.child_token())
    }
}

fn install_catalog(snapshot: &CatalogSnapshot, event_bus: &EventBus, body: &str) {
    match snapshot.set_from_bulk_response(body) {
        Ok(song_count) => event_bus.emit_lossy(AdapterEvent::CatalogLoaded {
            song_count,
            timestamp: Utc::now(),
        }),
        Err(SnapshotError::AlreadyLoaded) => {}
        Err(e @ SnapshotError::Deserialize(_)) => {
            event_bus.emit_lossy(AdapterEvent::CatalogLoadFailed {
                reason: e.to_string(),
                timestamp: Utc::now(),
            })
        }
    }
}
