use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var holding the TMDB read access token; beats the config file
pub const TMDB_TOKEN_ENV: &str = "TMDB_TOKEN";

/// Main configuration structure
///
/// This gets loaded from the config file and env vars.
/// Priority: Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load config from default location, or defaults if it doesn't exist
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// TMDB token, env var first
    pub fn tmdb_token(&self) -> Option<String> {
        std::env::var(TMDB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.tmdb.token.clone())
    }

    /// Get the config file path (XDG on Linux, the usual places elsewhere)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("cinescout");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API read access token (v4 bearer token)
    /// Get one at https://www.themoviedb.org/settings/api
    pub token: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Prefix for poster/backdrop paths
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
}

fn default_api_url() -> String {
    cinescout_api::tmdb::TMDB_API_BASE.to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            image_base_url: default_image_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Override for the SQLite file holding favorites
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// "light" or "dark"; used when the host doesn't say
    pub theme: Option<String>,

    /// How long the search box must sit still before we query
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_search_debounce_ms() -> u64 {
    500
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: None,
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}
