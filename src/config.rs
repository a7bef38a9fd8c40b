//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\artist-sync\config.toml
//! - macOS: ~/Library/Application Support/artist-sync/config.toml
//! - Linux: ~/.config/artist-sync/config.toml
//!
//! A different file can be passed with `--config`. Catalog credentials may
//! also come from the environment (see the CLI).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::matching::{DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD, Thresholds};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local artist store
    pub database: DatabaseConfig,

    /// External catalog connection
    pub catalog: CatalogConfig,

    /// Confidence thresholds
    pub matching: MatchingConfig,

    /// Batch pacing
    pub sync: SyncConfig,

    /// Who may trigger a sync
    pub auth: AuthConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::db::DEFAULT_DB_NAME),
        }
    }
}

/// Catalog API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Spotify application client ID
    pub client_id: Option<String>,

    /// Spotify application client secret
    pub client_secret: Option<String>,

    /// Web API root
    pub api_base_url: String,

    /// Accounts service root (token endpoint)
    pub accounts_base_url: String,

    /// ISO 3166-1 market to restrict search to
    pub market: Option<String>,

    /// Candidates requested per search (1-50)
    pub search_limit: u32,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Retries on rate limiting and server errors
    pub max_retries: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: "https://api.spotify.com".to_string(),
            accounts_base_url: "https://accounts.spotify.com".to_string(),
            market: None,
            search_limit: 10,
            request_timeout_secs: 10,
            max_retries: 3,
        }
    }
}

/// Match classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Similarity needed to auto-apply a match
    pub high_threshold: f32,

    /// Similarity needed to flag a match for review
    pub medium_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            medium_threshold: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            high: self.high_threshold,
            medium: self.medium_threshold,
        }
    }
}

/// Batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay after each artist, to stay under the catalog rate limit
    pub pacing_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: 150,
        }
    }
}

impl SyncConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

/// Authorized callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenEntry>,
}

/// A bearer token allowed to call the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Who the token belongs to (shown in logs)
    pub principal: String,

    /// Only "admin" may run a sync
    pub role: String,

    /// Lower-case hex SHA-256 of the token
    pub token_sha256: String,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("artist-sync"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path
///
/// Unlike [`load`], a missing or broken file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to a path
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
