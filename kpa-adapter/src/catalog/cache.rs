//! Resolution cache: song identifier → resolved entry
//!
//! At most one entry per identifier ever exists. Inserting for an identifier
//! that is already cached keeps the existing entry.

use crate::catalog::song::ResolvedEntry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, Arc<ResolvedEntry>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, song_id: &str) -> Option<Arc<ResolvedEntry>> {
        self.entries.read().await.get(song_id).cloned()
    }

    pub async fn contains(&self, song_id: &str) -> bool {
        self.entries.read().await.contains_key(song_id)
    }

    /// Insert a resolved entry unless one is already cached
    ///
    /// Returns the entry that is cached after the call, which is the existing
    /// one if the identifier was already present.
    pub async fn insert(&self, entry: ResolvedEntry) -> Arc<ResolvedEntry> {
        let mut entries = self.entries.write().await;
        Arc::clone(
            entries
                .entry(entry.song_id.clone())
                .or_insert_with(|| Arc::new(entry)),
        )
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn song_ids(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}
