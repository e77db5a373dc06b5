//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\metadata-retriever\config.toml
//! - macOS: ~/Library/Application Support/metadata-retriever/config.toml
//! - Linux: ~/.config/metadata-retriever/config.toml
//!
//! The config is loaded once at startup and passed by reference into the
//! art fetcher and lyrics backends. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials for remote providers
    pub credentials: Credentials,

    /// Cover art settings
    pub art: ArtConfig,

    /// Lyrics settings
    pub lyrics: LyricsConfig,

    /// HTTP transport settings
    pub http: HttpConfig,
}

/// API credentials
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Google Custom Search API key
    pub google_key: Option<String>,
    /// Google Custom Search engine identifier (`cx`)
    pub google_engine: Option<String>,
    /// Genius API bearer token
    pub genius_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() { "REDACTED" } else { "None" }
        }
        f.debug_struct("Credentials")
            .field("google_key", &redact(&self.google_key))
            .field("google_engine", &self.google_engine)
            .field("genius_api_key", &redact(&self.genius_api_key))
            .finish()
    }
}

/// Cover art settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtConfig {
    /// Resize remote images through the proxy to at most this width (0 = off)
    pub maxwidth: u32,

    /// Reject images narrower than this many pixels (0 = off)
    pub minwidth: u32,

    /// Filename stems recognized as cover art in album directories.
    /// The first entry also names the committed file.
    pub cover_names: Vec<String>,

    /// Only accept local images whose name matches `cover_names`
    pub cautious: bool,

    /// Record which source supplied the art on the album
    pub store_source: bool,

    /// Fetch during import (acted on by the host library's import hook)
    pub auto: bool,

    /// Ordered source list: `name`, `name:criterion` or `*`
    pub sources: Vec<String>,

    /// Try remote sources before local ones
    pub remote_priority: bool,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            maxwidth: 0,
            minwidth: 0,
            cover_names: ["cover", "front", "art", "album", "folder"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cautious: false,
            store_source: false,
            auto: true,
            sources: ["filesystem", "coverart", "google", "wikipedia"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            remote_priority: false,
        }
    }
}

/// Lyrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// Value stored when no lyrics are found (`None` leaves the field unset)
    pub fallback: Option<String>,

    /// Remove `[Chorus]`-style annotations from fetched lyrics
    pub strip_annotations: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            fallback: None,
            strip_annotations: true,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!(
                "metadata-retriever/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/metadata-retriever)"
            )
            .to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("metadata-retriever"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir.join("config.toml"))
}

/// Save configuration to a specific file.
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[art]"));
        assert!(toml.contains("[lyrics]"));
        assert!(toml.contains("[http]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.credentials.google_key = Some("test-key-123".to_string());
        config.art.maxwidth = 600;
        config.art.sources = vec!["coverart:release".to_string()];

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(
            parsed.credentials.google_key,
            Some("test-key-123".to_string())
        );
        assert_eq!(parsed.art.maxwidth, 600);
        assert_eq!(parsed.art.sources, vec!["coverart:release"]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[credentials]
genius_api_key = "my-token"

[art]
cautious = true
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.credentials.genius_api_key,
            Some("my-token".to_string())
        );
        assert!(config.art.cautious);

        // Other fields use defaults
        assert_eq!(config.art.cover_names[0], "cover");
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.lyrics.strip_annotations);
    }

    #[test]
    fn test_credentials_debug_redacts_keys() {
        let credentials = Credentials {
            google_key: Some("secret-google".to_string()),
            google_engine: Some("engine".to_string()),
            genius_api_key: Some("secret-genius".to_string()),
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret-google"));
        assert!(!debug.contains("secret-genius"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_save_and_load_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.lyrics.fallback = Some(String::new());
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.lyrics.fallback, Some(String::new()));
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = load_from(&path);
        assert_eq!(config.art.sources.len(), 4);
    }
}
