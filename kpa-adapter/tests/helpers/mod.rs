//! Shared test helpers
//!
//! `MockCatalog` is a real HTTP catalog server bound to an ephemeral port,
//! serving the bulk list at `/songs` and song texts below it.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use kpa_adapter::catalog::{HeaderParser, HttpCatalogClient};
use kpa_adapter::{AdapterConfig, KaraokeProviderAdapter};
use kpa_common::events::EventBus;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct CatalogState {
    bulk_status: Option<StatusCode>,
    bulk_body: String,
    files: HashMap<String, String>,
    bulk_requests: AtomicUsize,
    file_requests: AtomicUsize,
}

pub struct MockCatalog {
    addr: SocketAddr,
    state: Arc<CatalogState>,
}

impl MockCatalog {
    /// Serve `songs` as the catalog; each song gets a parseable text file
    pub async fn start(songs: &[(&str, &str, &str)]) -> Self {
        Self::start_without_files(songs, &[]).await
    }

    /// Like [`MockCatalog::start`], but the text files of `missing` answer 404
    pub async fn start_without_files(songs: &[(&str, &str, &str)], missing: &[&str]) -> Self {
        let records: Vec<_> = songs
            .iter()
            .map(|(id, artist, title)| {
                json!({
                    "songId": id,
                    "audioLink": format!("/{}.mp3", id),
                    "videoLink": "",
                    "coverLink": format!("/{}.jpg", id),
                    "backgroundLink": "",
                    "textLink": format!("/{}.txt", id),
                    "artist": artist,
                    "title": title,
                })
            })
            .collect();
        let files = songs
            .iter()
            .filter(|(id, _, _)| !missing.contains(id))
            .map(|(id, artist, title)| (format!("{}.txt", id), song_text(artist, title)))
            .collect();

        Self::spawn(CatalogState {
            bulk_body: serde_json::to_string(&records).unwrap(),
            files,
            ..Default::default()
        })
        .await
    }

    /// Catalog whose bulk list request fails with `status`
    pub async fn failing(status: StatusCode) -> Self {
        Self::spawn(CatalogState {
            bulk_status: Some(status),
            ..Default::default()
        })
        .await
    }

    async fn spawn(state: CatalogState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/songs", get(bulk))
            .route("/songs/:file", get(song_file))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn catalog_url(&self) -> String {
        format!("http://{}/songs", self.addr)
    }

    pub fn bulk_requests(&self) -> usize {
        self.state.bulk_requests.load(Ordering::SeqCst)
    }

    pub fn file_requests(&self) -> usize {
        self.state.file_requests.load(Ordering::SeqCst)
    }
}

async fn bulk(State(state): State<Arc<CatalogState>>) -> (StatusCode, String) {
    state.bulk_requests.fetch_add(1, Ordering::SeqCst);
    match state.bulk_status {
        Some(status) => (status, String::new()),
        None => (StatusCode::OK, state.bulk_body.clone()),
    }
}

async fn song_file(
    State(state): State<Arc<CatalogState>>,
    Path(file): Path<String>,
) -> (StatusCode, String) {
    state.file_requests.fetch_add(1, Ordering::SeqCst);
    match state.files.get(&file) {
        Some(text) => (StatusCode::OK, text.clone()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

pub fn song_text(artist: &str, title: &str) -> String {
    format!(
        "#TITLE:{}\n#ARTIST:{}\n#BPM:120\n: 0 4 60 Hel\n: 4 4 62 lo\nE\n",
        title, artist
    )
}

/// Adapter wired to the real HTTP client, storing songs below `dir`
pub fn adapter_for(catalog_url: String, dir: &TempDir) -> Arc<KaraokeProviderAdapter> {
    let client = HttpCatalogClient::new("kpa-adapter-tests", Some(Duration::from_secs(5))).unwrap();
    Arc::new(KaraokeProviderAdapter::new(
        AdapterConfig::new(catalog_url, dir.path().join("KaraokeProviderSongs")),
        Arc::new(client),
        Arc::new(HeaderParser::new()),
        EventBus::new(32),
    ))
}

/// Start the bulk fetch and wait for the catalog to become ready
pub async fn load(adapter: &KaraokeProviderAdapter) {
    adapter.on_load().await;
    tokio::time::timeout(Duration::from_secs(5), adapter.snapshot().wait_until_ready())
        .await
        .expect("catalog did not load");
}
