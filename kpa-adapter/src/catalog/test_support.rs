//! In-memory catalog client for unit tests

use crate::catalog::client::{resource_url, CatalogClient, CatalogClientError};
use crate::catalog::snapshot::RawCatalogEntry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE_URL: &str = "http://catalog.test/songs";

/// Serves canned bodies keyed by absolute URL and counts requests
#[derive(Default)]
pub struct FakeCatalogClient {
    bodies: Mutex<HashMap<String, Result<String, u16>>>,
    delay: Option<Duration>,
    bulk_calls: AtomicUsize,
    resource_calls: AtomicUsize,
}

impl FakeCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, url: &str) -> Result<String, CatalogClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.bodies.lock().unwrap().get(url).cloned();
        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(CatalogClientError::Status {
                status,
                url: url.to_string(),
            }),
            None => Err(CatalogClientError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalogClient {
    async fn fetch_bulk(&self, catalog_url: &str) -> Result<String, CatalogClientError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(catalog_url).await
    }

    async fn fetch_resource(
        &self,
        base_url: &str,
        relative_link: &str,
    ) -> Result<String, CatalogClientError> {
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(&resource_url(base_url, relative_link)).await
    }
}

pub fn record(song_id: &str, artist: &str, title: &str) -> RawCatalogEntry {
    RawCatalogEntry {
        song_id: song_id.to_string(),
        audio_link: format!("/{}.mp3", song_id),
        video_link: String::new(),
        cover_link: format!("/{}.jpg", song_id),
        background_link: String::new(),
        text_link: format!("/{}.txt", song_id),
        artist: artist.to_string(),
        title: title.to_string(),
    }
}

pub fn song_text(artist: &str, title: &str) -> String {
    format!(
        "#TITLE:{}\n#ARTIST:{}\n#BPM:200\n: 0 4 60 La\n: 4 4 62 la\nE\n",
        title, artist
    )
}

/// Serve a valid song text for `record` at its text link
pub fn serve_song(client: &FakeCatalogClient, record: &RawCatalogEntry) {
    client.serve(
        &resource_url(BASE_URL, &record.text_link),
        &song_text(&record.artist, &record.title),
    );
}
