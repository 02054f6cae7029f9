//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Feed sources and HTTP behavior
    #[serde(default)]
    pub feed: FeedConfig,

    /// Locality selection
    #[serde(default)]
    pub filter: FilterConfig,

    /// Event store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Announcement text rendering
    #[serde(default)]
    pub announcement: AnnouncementConfig,

    /// Announcement sink
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Render the effective configuration, defaults filled in, as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy with credential values masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for value in config.notifier.credentials.values_mut() {
            *value = "***".into();
        }
        config
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.urls.is_empty() {
            return Err(AppError::validation("feed.urls is empty"));
        }
        for url in &self.feed.urls {
            Url::parse(url)
                .map_err(|e| AppError::validation(format!("feed.urls entry {url:?}: {e}")))?;
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.filter.locality.trim().is_empty() {
            return Err(AppError::validation("filter.locality is empty"));
        }
        if self.storage.busy_timeout_ms == 0 {
            return Err(AppError::validation("storage.busy_timeout_ms must be > 0"));
        }
        if self.announcement.template.trim().is_empty() {
            return Err(AppError::validation("announcement.template is empty"));
        }
        if self.announcement.max_length == 0 {
            return Err(AppError::validation("announcement.max_length must be > 0"));
        }
        if self.notifier.kind == NotifierKind::Webhook {
            let url = self.notifier.webhook_url.as_deref().ok_or_else(|| {
                AppError::validation("notifier.webhook_url is required for kind = \"webhook\"")
            })?;
            Url::parse(url)
                .map_err(|e| AppError::validation(format!("notifier.webhook_url: {e}")))?;
        }
        Ok(())
    }
}

/// Feed retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Candidate feed URLs, tried in order
    #[serde(default = "defaults::feed_urls")]
    pub urls: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            urls: defaults::feed_urls(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// How a feed entry's region text is compared with the locality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalityMatch {
    /// Case-sensitive substring
    #[default]
    Contains,
    /// Case-sensitive equality with the region field
    Exact,
}

/// Locality selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Country or region name to keep
    #[serde(default = "defaults::locality")]
    pub locality: String,

    #[serde(default)]
    pub match_mode: LocalityMatch,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            locality: defaults::locality(),
            match_mode: LocalityMatch::default(),
        }
    }
}

/// Event store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Folder holding the database files
    #[serde(default = "defaults::base_folder")]
    pub base_folder: PathBuf,

    /// How long a write waits on a locked database
    #[serde(default = "defaults::busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_folder: defaults::base_folder(),
            busy_timeout_ms: defaults::busy_timeout(),
        }
    }
}

/// Announcement rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementConfig {
    /// Text template; see `AnnouncementTemplate` for placeholders
    #[serde(default = "defaults::template")]
    pub template: String,

    /// Maximum announcement length in graphemes
    #[serde(default = "defaults::max_length")]
    pub max_length: usize,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            template: defaults::template(),
            max_length: defaults::max_length(),
        }
    }
}

/// Which notifier receives announcements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

/// Notifier settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    /// Endpoint for `kind = "webhook"`
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Opaque credentials, sent as HTTP headers
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

mod defaults {
    use std::path::PathBuf;

    // Feed defaults
    pub fn feed_urls() -> Vec<String> {
        vec![
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson".into(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson".into(),
        ]
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; quakewatch/0.1)".into()
    }

    // Filter defaults
    pub fn locality() -> String {
        "Venezuela".into()
    }

    // Storage defaults
    pub fn base_folder() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn busy_timeout() -> u64 {
        5000
    }

    // Announcement defaults
    pub fn template() -> String {
        "SISMO. {magnitude} grados {magnitude_type} {where}. A horas {local_time} {link}".into()
    }
    pub fn max_length() -> usize {
        280
    }
}
