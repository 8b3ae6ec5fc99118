//! Catalog snapshot
//!
//! The in-memory list of raw catalog records from the one bulk fetch. The
//! readiness transition happens at most once: a second completion signal is
//! rejected and the record sequence never changes afterwards.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// One record of the remote catalog list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogEntry {
    /// Stable unique identifier, used as cache key
    pub song_id: String,
    #[serde(default)]
    pub audio_link: String,
    #[serde(default)]
    pub video_link: String,
    #[serde(default)]
    pub cover_link: String,
    #[serde(default)]
    pub background_link: String,
    #[serde(default)]
    pub text_link: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

impl RawCatalogEntry {
    /// Case-insensitive substring match against title or artist
    ///
    /// `query_lower` must already be lower-cased.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.artist.to_lowercase().contains(query_lower)
    }
}

/// Snapshot errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Catalog response is not a valid song list: {0}")]
    Deserialize(String),

    #[error("Catalog already loaded")]
    AlreadyLoaded,
}

/// Records from the bulk fetch plus the readiness latch
pub struct CatalogSnapshot {
    entries: OnceLock<Arc<[RawCatalogEntry]>>,
    ready_tx: watch::Sender<bool>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            entries: OnceLock::new(),
            ready_tx,
        }
    }

    /// Parse the bulk response body and mark the snapshot ready
    ///
    /// Returns the number of records. A body that does not deserialize leaves
    /// the snapshot not-ready and empty.
    pub fn set_from_bulk_response(&self, body: &str) -> Result<usize, SnapshotError> {
        if self.is_ready() {
            warn!("Ignoring duplicate catalog completion; {} songs already loaded", self.len());
            return Err(SnapshotError::AlreadyLoaded);
        }

        let records: Vec<RawCatalogEntry> = serde_json::from_str(body).map_err(|e| {
            error!("Catalog response could not be deserialized: {}", e);
            SnapshotError::Deserialize(e.to_string())
        })?;

        self.set_entries(records)
    }

    /// Install already-deserialized records and mark the snapshot ready
    pub fn set_entries(&self, records: Vec<RawCatalogEntry>) -> Result<usize, SnapshotError> {
        let count = records.len();
        if self.entries.set(Arc::from(records)).is_err() {
            warn!("Ignoring duplicate catalog completion; {} songs already loaded", self.len());
            return Err(SnapshotError::AlreadyLoaded);
        }

        self.ready_tx.send_replace(true);
        info!("{} songs found", count);
        Ok(count)
    }

    pub fn is_ready(&self) -> bool {
        self.entries.get().is_some()
    }

    /// All records in catalog order; empty while not ready
    pub fn all(&self) -> Arc<[RawCatalogEntry]> {
        self.entries
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.entries.get().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until the snapshot becomes ready
    ///
    /// Never returns if the bulk fetch failed; wrap in a timeout.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
