//! kpa-adapter - Remote karaoke catalog adapter service
//!
//! Loads the remote catalog list on startup, resolves songs on demand into
//! locally cached song files and serves searches over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use kpa_common::config::{
    default_config_path, get_user_agent, load_toml_config, resolve_catalog_url,
    RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use kpa_common::events::EventBus;
use kpa_adapter::catalog::{HeaderParser, HttpCatalogClient};
use kpa_adapter::{build_router, AdapterConfig, AppState, KaraokeProviderAdapter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Command-line arguments for kpa-adapter
#[derive(Parser, Debug)]
#[command(name = "kpa-adapter")]
#[command(about = "Remote karaoke catalog adapter")]
#[command(version)]
struct Args {
    /// TOML config file (default: ~/.config/kpa/kpa-adapter.toml)
    #[arg(short, long, env = "KPA_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog base URL (overrides KPA_CATALOG_URL and the config file)
    #[arg(long)]
    catalog_url: Option<String>,

    /// App-data folder receiving downloaded songs
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "KPA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .init();

    info!(
        "Starting kpa-adapter v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let catalog_url = resolve_catalog_url(args.catalog_url.as_deref(), &toml_config)?;

    let root_folder = RootFolderResolver::new("kpa-adapter")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Songs folder: {}", initializer.songs_folder().display());

    let client = HttpCatalogClient::new(
        &get_user_agent(),
        toml_config.http_timeout_secs.map(Duration::from_secs),
    )?;
    let event_bus = EventBus::new(256);
    let adapter = Arc::new(KaraokeProviderAdapter::new(
        AdapterConfig::from_toml(catalog_url, initializer.songs_folder(), &toml_config),
        Arc::new(client),
        Arc::new(HeaderParser::new()),
        event_bus,
    ));

    adapter.on_load().await;

    let port = args.port.unwrap_or(toml_config.port);
    let state = AppState::new(Arc::clone(&adapter), toml_config, config_path);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    adapter.on_unload().await;
    info!("kpa-adapter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
