//! Per-song resolution pipeline
//!
//! Turns one catalog record into a cached [`ResolvedEntry`]:
//! cache check → text fetch → local write → external parse → link enrichment
//! → cache insert.
//!
//! Per identifier the resolution moves through
//! `Unresolved → FetchPending → Cached`, or back to `Unresolved` when the fetch
//! or parse fails (a later search retries). Concurrent callers for the same
//! identifier join one pending run instead of repeating the work.

use crate::catalog::cache::ResolutionCache;
use crate::catalog::client::{CatalogClient, CatalogClientError};
use crate::catalog::snapshot::RawCatalogEntry;
use crate::catalog::song::{ParseError, ParsedSong, ResolvedEntry, SongParser};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use kpa_common::events::{AdapterEvent, EventBus};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Provenance tag written into every resolved song
pub const REMOTE_SOURCE: &str = "KaraokeProviderAdapter";

/// Why one resolution attempt produced no entry
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Catalog record has no text link")]
    MissingTextLink,

    #[error("Fetching song text failed: {0}")]
    Fetch(#[from] CatalogClientError),

    #[error("Writing {path} failed: {message}")]
    Storage { path: PathBuf, message: String },

    #[error("Parsing song failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Resolution task failed: {0}")]
    Task(String),
}

/// Resolution state of one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionState {
    Unresolved,
    FetchPending,
    Cached,
}

type PendingResolution = Shared<BoxFuture<'static, Result<Arc<ResolvedEntry>, ResolveError>>>;

/// Resolver handle. Cloning is cheap and shares cache and in-flight state.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    base_url: String,
    songs_folder: PathBuf,
    client: Arc<dyn CatalogClient>,
    parser: Arc<dyn SongParser>,
    cache: Arc<ResolutionCache>,
    in_flight: Mutex<HashMap<String, PendingResolution>>,
    event_bus: Option<EventBus>,
}

impl Resolver {
    pub fn new(
        base_url: impl Into<String>,
        songs_folder: PathBuf,
        client: Arc<dyn CatalogClient>,
        parser: Arc<dyn SongParser>,
        cache: Arc<ResolutionCache>,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                base_url: base_url.into(),
                songs_folder,
                client,
                parser,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                event_bus,
            }),
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.inner.cache
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub async fn state(&self, song_id: &str) -> ResolutionState {
        if self.inner.cache.contains(song_id).await {
            ResolutionState::Cached
        } else if self.inner.in_flight.lock().await.contains_key(song_id) {
            ResolutionState::FetchPending
        } else {
            ResolutionState::Unresolved
        }
    }

    /// Resolve a record, or None if it cannot be resolved right now
    ///
    /// Failures were already logged; callers exclude None from their results.
    pub async fn resolve(
        &self,
        record: &RawCatalogEntry,
        cancel: &CancellationToken,
    ) -> Option<Arc<ResolvedEntry>> {
        self.try_resolve(record, cancel).await.ok()
    }

    /// Resolve a record, reporting why it failed
    pub async fn try_resolve(
        &self,
        record: &RawCatalogEntry,
        cancel: &CancellationToken,
    ) -> Result<Arc<ResolvedEntry>, ResolveError> {
        if let Some(entry) = self.inner.cache.get(&record.song_id).await {
            debug!(song_id = %record.song_id, "Resolution cache hit");
            return Ok(entry);
        }
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;

            // A finished run caches its entry before dropping its in-flight marker
            if let Some(entry) = self.inner.cache.get(&record.song_id).await {
                return Ok(entry);
            }

            match in_flight.get(&record.song_id) {
                Some(pending) => {
                    debug!(song_id = %record.song_id, "Joining in-flight resolution");
                    pending.clone()
                }
                None => {
                    let pending = self.spawn_run(record.clone());
                    in_flight.insert(record.song_id.clone(), pending.clone());
                    pending
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(song_id = %record.song_id, "Resolution cancelled by caller");
                Err(ResolveError::Cancelled)
            }
            result = pending => result,
        }
    }

    /// Drive one pipeline run on its own task
    ///
    /// The run finishes even when every waiting caller has given up. The
    /// returned handle only holds a weak reference back to the resolver.
    fn spawn_run(&self, record: RawCatalogEntry) -> PendingResolution {
        let song_id = record.song_id.clone();
        let inner = Arc::downgrade(&self.inner);
        let task = tokio::spawn(self.clone().run(record));

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(song_id = %song_id, error = %e, "Resolution task failed");
                    if let Some(inner) = inner.upgrade() {
                        inner.in_flight.lock().await.remove(&song_id);
                    }
                    Err(ResolveError::Task(e.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// One pipeline run; removes its in-flight marker when done
    async fn run(self, record: RawCatalogEntry) -> Result<Arc<ResolvedEntry>, ResolveError> {
        let result = self.fetch_store_parse(&record).await;

        match &result {
            Ok(entry) => {
                info!(song_id = %record.song_id, "'{} - {}' added", entry.song.artist, entry.song.title);
                self.emit(AdapterEvent::SongResolved {
                    song_id: record.song_id.clone(),
                    artist: entry.song.artist.clone(),
                    title: entry.song.title.clone(),
                    issue_count: entry.issues.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    song_id = %record.song_id,
                    artist = %record.artist,
                    title = %record.title,
                    error = %e,
                    "Failed to resolve song"
                );
                self.emit(AdapterEvent::SongResolutionFailed {
                    song_id: record.song_id.clone(),
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        self.inner.in_flight.lock().await.remove(&record.song_id);
        result
    }

    async fn fetch_store_parse(
        &self,
        record: &RawCatalogEntry,
    ) -> Result<Arc<ResolvedEntry>, ResolveError> {
        if record.text_link.is_empty() {
            return Err(ResolveError::MissingTextLink);
        }

        let text = self
            .inner
            .client
            .fetch_resource(&self.inner.base_url, &record.text_link)
            .await?;

        let path = song_file_path(&self.inner.songs_folder, &record.artist, &record.title);
        write_song_file(&path, &text).await?;
        debug!(song_id = %record.song_id, path = %path.display(), "Song file written");

        let parser = Arc::clone(&self.inner.parser);
        let parse_path = path.clone();
        let ParsedSong { mut song, issues } =
            tokio::task::spawn_blocking(move || parser.parse_file(&parse_path))
                .await
                .map_err(|e| {
                    ResolveError::Parse(ParseError::Invalid {
                        path: path.clone(),
                        message: format!("parser task failed: {}", e),
                    })
                })??;

        let base_url = &self.inner.base_url;
        song.remote_source = Some(REMOTE_SOURCE.to_string());
        song.audio = absolute_link(base_url, &record.audio_link);
        song.video = absolute_link(base_url, &record.video_link);
        song.cover = absolute_link(base_url, &record.cover_link);
        song.background = absolute_link(base_url, &record.background_link);

        let entry = ResolvedEntry {
            song_id: record.song_id.clone(),
            song,
            issues,
        };
        Ok(self.inner.cache.insert(entry).await)
    }

    fn emit(&self, event: AdapterEvent) {
        if let Some(bus) = &self.inner.event_bus {
            bus.emit_lossy(event);
        }
    }
}

/// Base URL + relative link, or None when the catalog gives no link
pub fn absolute_link(base_url: &str, relative_link: &str) -> Option<String> {
    if relative_link.is_empty() {
        None
    } else {
        Some(format!("{}{}", base_url, relative_link))
    }
}

/// `<songs_folder>/<artist>/<title>/<artist> - <title>.txt`
///
/// Same-named songs map to the same file; the later download overwrites.
pub fn song_file_path(songs_folder: &Path, artist: &str, title: &str) -> PathBuf {
    let artist = sanitize_path_component(artist);
    let title = sanitize_path_component(title);
    let file_name = format!("{} - {}.txt", artist, title);
    songs_folder.join(&artist).join(&title).join(file_name)
}

/// Make a catalog string safe to use as one path component
pub fn sanitize_path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

async fn write_song_file(path: &Path, text: &str) -> Result<(), ResolveError> {
    let storage_error = |e: std::io::Error| ResolveError::Storage {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
    }
    tokio::fs::write(path, text).await.map_err(storage_error)
}
