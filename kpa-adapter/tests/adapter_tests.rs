//! Adapter integration tests against a live HTTP catalog

mod helpers;

use axum::http::StatusCode;
use futures::StreamExt;
use helpers::{adapter_for, load, MockCatalog};
use kpa_adapter::catalog::resolver::song_file_path;
use kpa_adapter::SongRepository;
use kpa_common::events::AdapterEvent;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_search_resolves_over_http() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo"), ("2", "Queen", "Bohemian")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);

    load(&adapter).await;
    assert_eq!(adapter.snapshot().len(), 2);

    let results = adapter.search(Some("foo")).await;
    assert_eq!(results.len(), 1);

    let entry = &results[0];
    assert_eq!(entry.song_id, "1");
    assert_eq!(entry.song.title, "Foo");
    assert_eq!(entry.song.artist, "Bar");
    assert_eq!(entry.song.remote_source.as_deref(), Some("KaraokeProviderAdapter"));

    let audio = format!("{}/1.mp3", catalog.catalog_url());
    let cover = format!("{}/1.jpg", catalog.catalog_url());
    assert_eq!(entry.audio_link(), Some(audio.as_str()));
    assert_eq!(entry.cover_link(), Some(cover.as_str()));
    assert_eq!(entry.video_link(), None);
    assert_eq!(entry.background_link(), None);

    let stored = song_file_path(&dir.path().join("KaraokeProviderSongs"), "Bar", "Foo");
    let text = std::fs::read_to_string(stored).unwrap();
    assert!(text.contains("#TITLE:Foo"));

    assert_eq!(catalog.file_requests(), 1);
}

#[tokio::test]
async fn test_repeat_search_uses_cache() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;

    let first = adapter.search(Some("foo")).await;
    let second = adapter.search(Some("BAR")).await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(std::sync::Arc::ptr_eq(&first[0], &second[0]));
    assert_eq!(catalog.file_requests(), 1);
}

#[tokio::test]
async fn test_on_load_fetches_catalog_once() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);

    load(&adapter).await;
    assert!(!adapter.on_load().await);
    assert!(!adapter.on_load().await);

    assert_eq!(catalog.bulk_requests(), 1);
}

#[tokio::test]
async fn test_concurrent_searches_fetch_song_once() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;

    let (a, b, c) = tokio::join!(
        adapter.search(Some("foo")),
        adapter.search(Some("bar")),
        adapter.search(Some("fo")),
    );

    assert_eq!((a.len(), b.len(), c.len()), (1, 1, 1));
    assert_eq!(catalog.file_requests(), 1);
}

#[tokio::test]
async fn test_missing_song_file_is_left_out() {
    let catalog =
        MockCatalog::start_without_files(&[("1", "Bar", "Foo One"), ("2", "Bar", "Foo Two")], &["1"])
            .await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;

    let results = adapter.search(Some("foo")).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].song_id, "2");
    assert!(!adapter.cache().contains("1").await);

    // Failed resolutions are not cached, so the next search retries
    adapter.search(Some("foo")).await;
    assert_eq!(catalog.file_requests(), 3);
}

#[tokio::test]
async fn test_unmatched_query_makes_no_song_requests() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;

    assert!(adapter.search(Some("nothing like it")).await.is_empty());
    assert_eq!(catalog.file_requests(), 0);
}

#[tokio::test]
async fn test_bulk_failure_leaves_search_empty() {
    let catalog = MockCatalog::failing(StatusCode::INTERNAL_SERVER_ERROR).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    let mut events = adapter.event_bus().subscribe();

    adapter.on_load().await;

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        AdapterEvent::CatalogLoadFailed { reason, .. } => assert!(reason.contains("500")),
        other => panic!("unexpected event {:?}", other),
    }

    assert!(!adapter.snapshot().is_ready());
    assert!(adapter.search(Some("foo")).await.is_empty());
    assert_eq!(catalog.file_requests(), 0);
}

#[tokio::test]
async fn test_search_songs_stream() {
    let catalog = MockCatalog::start(&[
        ("1", "Band", "Love A"),
        ("2", "Band", "Hate"),
        ("3", "Band", "Love B"),
    ])
    .await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;

    let titles: Vec<String> = adapter
        .search_songs(Some("love"))
        .map(|entry| entry.song.title.clone())
        .collect()
        .await;

    assert_eq!(titles, vec!["Love A", "Love B"]);
}

#[tokio::test]
async fn test_unload_emits_event_and_stops_searches() {
    let catalog = MockCatalog::start(&[("1", "Bar", "Foo")]).await;
    let dir = TempDir::new().unwrap();
    let adapter = adapter_for(catalog.catalog_url(), &dir);
    load(&adapter).await;
    let mut events = adapter.event_bus().subscribe();

    adapter.on_unload().await;

    let event = events.recv().await.unwrap();
    assert!(matches!(event, AdapterEvent::AdapterUnloaded { .. }));
    assert!(adapter.search(Some("foo")).await.is_empty());
    assert_eq!(catalog.file_requests(), 0);
}
