//! Configuration module for bizdeck
//!
//! Engine tunables: page size, pagination window, search strictness,
//! debounce period and where the home-feed hand-off lives.
//! Configuration is stored in the user's config directory as TOML.

use crate::model::Entity;
use crate::search::SearchOptions;
use crate::store::{HANDOFF_KEY, SledSnapshotSlot};
use crate::view::DEFAULT_PAGE_SIZE;
use crate::view::pagination::DEFAULT_MAX_VISIBLE_PAGES;
use config::{Config, ConfigError, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Entities per page
    pub page_size: usize,

    /// Page numbers shown at once in the navigation bar
    pub max_visible_pages: usize,

    /// Fuzzy match tolerance, 0.0 (exact) to 1.0 (anything)
    pub search_threshold: f64,

    /// Offset at which a match position costs a full point of score
    pub search_distance: usize,

    /// Quiet period before a search query is acted on
    pub debounce_ms: u64,

    /// Key of the home-feed hand-off slot
    pub handoff_key: String,

    /// Directory of the hand-off database; the data directory when unset
    pub snapshot_db: Option<PathBuf>,

    /// Suppress success notifications on the console
    pub quiet: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
            search_threshold: crate::search::DEFAULT_THRESHOLD,
            search_distance: crate::search::DEFAULT_DISTANCE,
            debounce_ms: 300,
            handoff_key: HANDOFF_KEY.to_string(),
            snapshot_db: None,
            quiet: false,
        }
    }
}

impl EngineConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("bizdeck").join("config.toml"))
    }

    /// Load configuration from the user's config file
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or holds invalid values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or holds invalid values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text cannot be parsed or holds invalid values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user's config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be determined or
    /// the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Reject values the engine cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Message("page_size must be at least 1".to_string()));
        }
        if self.max_visible_pages == 0 {
            return Err(ConfigError::Message("max_visible_pages must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.search_threshold) {
            return Err(ConfigError::Message(format!(
                "search_threshold must be between 0.0 and 1.0, got {}",
                self.search_threshold
            )));
        }
        if self.handoff_key.trim().is_empty() {
            return Err(ConfigError::Message("handoff_key must not be empty".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Search options over the default keys of `E`
    #[must_use]
    pub fn search_options<E: Entity>(&self) -> SearchOptions {
        SearchOptions::for_entity::<E>()
            .with_threshold(self.search_threshold)
            .with_distance(self.search_distance)
    }

    /// Directory of the hand-off database
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no path is configured and the system data
    /// directory cannot be determined.
    pub fn snapshot_db_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.snapshot_db {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))?;
        Ok(data_dir.join("bizdeck").join("snapshots"))
    }

    /// Open the configured hand-off slot
    ///
    /// # Errors
    ///
    /// Returns `BizdeckError` if the path cannot be resolved or the database
    /// cannot be opened.
    pub fn open_handoff<E>(&self) -> Result<SledSnapshotSlot<E>, crate::BizdeckError>
    where
        E: Entity + Serialize + DeserializeOwned,
    {
        let path = self.snapshot_db_path()?;
        Ok(SledSnapshotSlot::open(path, &self.handoff_key)?)
    }
}
