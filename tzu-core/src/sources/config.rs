//! Source configuration
//!
//! Where the published versions live and where the local copy is found.
//! Loaded from `sources.yaml` in the user config directory; built-in defaults
//! point at the ICU repository.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::SourceError;

/// Directory listing of published time zone resources
pub const DEFAULT_BASE_URL: &str =
    "http://source.icu-project.org/repos/icu/data/trunk/tzdata/icu/";

/// Path of the resource inside each version directory
pub const DEFAULT_ENTRY_SUFFIX: &str = "/be/zoneinfo.res";

/// Local copy, relative to the working directory
pub const DEFAULT_LOCAL_FILE: &str = "zoneinfo.res";

/// HTTP timeout for the listing request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE: &str = "sources.yaml";

/// Source configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// URL of the directory listing; entry names are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Appended after each entry name to form its resource location
    #[serde(default = "default_entry_suffix")]
    pub entry_suffix: String,

    /// Local resource file
    #[serde(default = "default_local_file")]
    pub local_file: PathBuf,

    /// Listing request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_entry_suffix() -> String {
    DEFAULT_ENTRY_SUFFIX.to_string()
}

fn default_local_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_FILE)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            entry_suffix: default_entry_suffix(),
            local_file: default_local_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self, SourceError> {
        Self::load_from_path(&Self::default_config_path()?)
    }

    /// Load configuration from a specific path, or defaults if it does not exist
    pub fn load_from_path(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            tracing::debug!("No source config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| SourceError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml_ng::from_str(&content).map_err(|source| SourceError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<(), SourceError> {
        let write_err = |source: std::io::Error| SourceError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_yaml_ng::to_string(self)
            .map_err(|source| SourceError::ConfigSerialize { source })?;

        std::fs::write(path, content).map_err(write_err)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf, SourceError> {
        let config_dir = directories::ProjectDirs::from("org", "icu-project", "tzu")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("tzu")))
            .ok_or(SourceError::NoConfigDir)?;

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// URL of the directory listing
    pub fn listing_url(&self) -> Result<Url, SourceError> {
        Url::parse(&self.base_url).map_err(|source| SourceError::MalformedLocation {
            location: self.base_url.clone(),
            source,
        })
    }

    /// Resource location of a listed version
    pub fn entry_location(&self, name: &str) -> Result<Url, SourceError> {
        let location = format!("{}{}{}", self.base_url, name, self.entry_suffix);
        Url::parse(&location).map_err(|source| SourceError::MalformedLocation { location, source })
    }

    /// Local resource path, resolved against the working directory
    pub fn local_path(&self) -> PathBuf {
        if self.local_file.is_absolute() {
            return self.local_file.clone();
        }

        std::env::current_dir()
            .map(|cwd| cwd.join(&self.local_file))
            .unwrap_or_else(|_| self.local_file.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
