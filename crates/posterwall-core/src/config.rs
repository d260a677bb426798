use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::models::MediaKind;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration. Loaded once at startup and passed
/// into the pipeline constructors as an immutable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub libraries: LibrariesConfig,
    pub storage: StorageConfig,
    pub image: ImageConfig,
    pub network: NetworkConfig,
    pub assist: AssistConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrariesConfig {
    pub movies: String,
    pub shows: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub movies_dir: String,
    pub shows_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    pub enabled: bool,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Extra trailing edition tags stripped during title normalization,
    /// on top of the built-in list.
    pub extra_edition_tags: Vec<String>,
}

impl AppConfig {
    /// Load config from the given path, the user config file, or the
    /// built-in defaults, in that order of preference. An explicitly
    /// passed path must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let raw = std::fs::read_to_string(path)?;
            return toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()));
        }

        let path = Self::config_path();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using built-in defaults");
            toml::from_str(DEFAULT_CONFIG).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Path to the user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "posterwall")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Check everything the run depends on, creating the poster root
    /// directories when absent. Violations abort before any processing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.server.base_url).map_err(|e| ConfigError::Invalid {
            name: "server.base_url",
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid {
                name: "server.base_url",
                reason: "must start with http:// or https://".into(),
            });
        }
        if self.server.token.is_empty() {
            return Err(ConfigError::Missing("server.token"));
        }
        if self.libraries.movies.is_empty() {
            return Err(ConfigError::Missing("libraries.movies"));
        }
        if self.libraries.shows.is_empty() {
            return Err(ConfigError::Missing("libraries.shows"));
        }
        Self::check_root_dir("storage.movies_dir", &self.storage.movies_dir)?;
        Self::check_root_dir("storage.shows_dir", &self.storage.shows_dir)?;
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(ConfigError::Invalid {
                name: "image.jpeg_quality",
                reason: "must be between 1 and 100".into(),
            });
        }
        if self.network.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "network.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.network.retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "network.retry_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.assist.enabled && self.assist.api_key.is_empty() {
            return Err(ConfigError::Missing("assist.api_key"));
        }
        Ok(())
    }

    fn check_root_dir(name: &'static str, dir: &str) -> Result<(), ConfigError> {
        if dir.is_empty() {
            return Err(ConfigError::Missing(name));
        }
        let path = Path::new(dir);
        if !path.is_absolute() {
            return Err(ConfigError::Invalid {
                name,
                reason: "must be an absolute path".into(),
            });
        }
        std::fs::create_dir_all(path).map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("not creatable: {e}"),
        })
    }

    /// Library name configured for the given media kind.
    pub fn library_name(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Movie => &self.libraries.movies,
            MediaKind::Show => &self.libraries.shows,
        }
    }

    /// Local poster root configured for the given media kind.
    pub fn root_dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Movie => Path::new(&self.storage.movies_dir),
            MediaKind::Show => Path::new(&self.storage.shows_dir),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
