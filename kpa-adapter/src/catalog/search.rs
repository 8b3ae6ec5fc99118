//! Search engine over the catalog snapshot
//!
//! Filters the snapshot by case-insensitive substring match on title or
//! artist, resolves each match and returns the entries that resolved, in
//! catalog order. Never fails: unresolvable matches are left out.

use crate::catalog::resolver::Resolver;
use crate::catalog::snapshot::{CatalogSnapshot, RawCatalogEntry};
use crate::catalog::song::ResolvedEntry;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SearchEngine {
    snapshot: Arc<CatalogSnapshot>,
    resolver: Resolver,
    max_concurrent: usize,
}

impl SearchEngine {
    pub fn new(snapshot: Arc<CatalogSnapshot>, resolver: Resolver, max_concurrent: usize) -> Self {
        Self {
            snapshot,
            resolver,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Catalog records matching `query`, or None when the search must yield nothing
    ///
    /// Nothing is searched before the catalog has loaded or for an empty query.
    pub fn matching_entries(&self, query: Option<&str>) -> Option<Vec<RawCatalogEntry>> {
        if !self.snapshot.is_ready() {
            debug!("songs not loaded yet");
            return None;
        }

        // Whitespace-only counts as empty; otherwise the text is matched as given
        let query = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => {
                debug!("no search text given");
                return None;
            }
        };

        let query_lower = query.to_lowercase();
        Some(
            self.snapshot
                .all()
                .iter()
                .filter(|entry| entry.matches(&query_lower))
                .cloned()
                .collect(),
        )
    }

    /// Run a search to completion
    pub async fn search(
        &self,
        query: Option<&str>,
        cancel: &CancellationToken,
    ) -> Vec<Arc<ResolvedEntry>> {
        let Some(matches) = self.matching_entries(query) else {
            return Vec::new();
        };
        let match_count = matches.len();
        debug!("searching song with search text: '{}'", query.unwrap_or_default());

        let results: Vec<Arc<ResolvedEntry>> = self
            .resolve_in_order(matches, cancel.clone())
            .collect()
            .await;

        info!(
            "Found {} songs matching search '{}' ({} catalog matches)",
            results.len(),
            query.unwrap_or_default(),
            match_count
        );
        results
    }

    /// Run a search on its own task, delivering entries as they resolve
    ///
    /// Dropping the returned stream cancels the remaining resolutions.
    pub fn search_stream(
        &self,
        query: Option<&str>,
        cancel: CancellationToken,
    ) -> BoxStream<'static, Arc<ResolvedEntry>> {
        let Some(matches) = self.matching_entries(query) else {
            return stream::empty().boxed();
        };

        let (tx, rx) = mpsc::channel(self.max_concurrent);
        let engine = self.clone();
        let query = query.unwrap_or_default().to_string();

        tokio::spawn(async move {
            let mut delivered = 0usize;
            let mut results = engine.resolve_in_order(matches, cancel.clone());

            while let Some(entry) = results.next().await {
                if tx.send(entry).await.is_err() {
                    debug!("search '{}' abandoned by caller", query);
                    cancel.cancel();
                    return;
                }
                delivered += 1;
            }
            info!("Found {} songs matching search '{}'", delivered, query);
        });

        ReceiverStream::new(rx).boxed()
    }

    /// Resolve matches with bounded concurrency, keeping catalog order
    fn resolve_in_order(
        &self,
        matches: Vec<RawCatalogEntry>,
        cancel: CancellationToken,
    ) -> BoxStream<'static, Arc<ResolvedEntry>> {
        let resolver = self.resolver.clone();

        stream::iter(matches)
            .map(move |record| {
                let resolver = resolver.clone();
                let cancel = cancel.clone();
                async move { resolver.resolve(&record, &cancel).await }
            })
            .buffered(self.max_concurrent)
            .filter_map(|entry| async move { entry })
            .boxed()
    }
}
