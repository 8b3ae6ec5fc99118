//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Catalog base URL used when nothing else is configured
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8080/songs";

/// HTTP port of the adapter service
pub const DEFAULT_PORT: u16 = 5780;

/// Upper bound of concurrent per-song resolutions inside one search
pub const DEFAULT_MAX_CONCURRENT_RESOLUTIONS: usize = 4;

/// Environment variable overriding the catalog base URL
pub const ENV_CATALOG_URL: &str = "KPA_CATALOG_URL";

/// Environment variable overriding the root (app-data) folder
pub const ENV_ROOT_FOLDER: &str = "KPA_ROOT_FOLDER";

/// Folder below the root folder that receives downloaded song files
pub const SONGS_FOLDER_NAME: &str = "KaraokeProviderSongs";

/// Bootstrap configuration loaded from TOML file
///
/// Every field has a built-in default, so an absent or partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Base URL of the remote karaoke catalog
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// App-data folder (downloaded songs live below it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of songs resolved concurrently for a single search
    #[serde(default = "default_max_concurrent_resolutions")]
    pub max_concurrent_resolutions: usize,

    /// Request timeout for catalog HTTP calls. None means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            root_folder: None,
            port: default_port(),
            max_concurrent_resolutions: default_max_concurrent_resolutions(),
            http_timeout_secs: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_concurrent_resolutions() -> usize {
    DEFAULT_MAX_CONCURRENT_RESOLUTIONS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the adapter's TOML file (`~/.config/kpa/kpa-adapter.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kpa").join("kpa-adapter.toml"))
}

/// Load TOML configuration
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write TOML configuration
///
/// Writes to a sibling temp file first and renames it over the target, so a
/// crash never leaves a half-written config behind.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Validate a catalog URL (non-empty, http or https scheme)
pub fn is_valid_catalog_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Resolve the catalog base URL: CLI → ENV → TOML → default
pub fn resolve_catalog_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    if let Some(url) = cli_arg {
        return checked_url(url, "command line");
    }

    if let Ok(url) = std::env::var(ENV_CATALOG_URL) {
        if !url.trim().is_empty() {
            return checked_url(&url, "environment");
        }
    }

    checked_url(&toml_config.catalog_url, "TOML config")
}

fn checked_url(url: &str, source: &str) -> Result<String> {
    if is_valid_catalog_url(url) {
        info!("Catalog URL {} (from {})", url.trim(), source);
        Ok(url.trim().to_string())
    } else {
        Err(Error::Config(format!(
            "Invalid catalog URL '{}' from {}: expected http:// or https://",
            url, source
        )))
    }
}

/// User-agent sent with every catalog request
pub fn get_user_agent() -> String {
    format!("kpa-adapter/{}", env!("CARGO_PKG_VERSION"))
}

/// Root folder resolution
///
/// Priority: CLI argument → `KPA_ROOT_FOLDER` → TOML `root_folder` → OS default
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    /// Resolve the root folder. Never fails; falls back to the OS default.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.is_empty() {
                info!("{}: root folder from {}", self.module_name, ENV_ROOT_FOLDER);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!("{}: root folder from TOML config", self.module_name);
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/kpa
        dirs::data_dir()
            .map(|d| d.join("kpa"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/kpa"))
    } else {
        // ~/.local/share/kpa or %LOCALAPPDATA%\kpa
        dirs::data_local_dir()
            .map(|d| d.join("kpa"))
            .unwrap_or_else(|| PathBuf::from("./kpa_data"))
    }
}

/// Creates the root folder layout on startup
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create root folder and songs folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.songs_folder())?;
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Folder receiving downloaded song files
    pub fn songs_folder(&self) -> PathBuf {
        self.root_folder.join(SONGS_FOLDER_NAME)
    }
}
