//! # Configuration
//!
//! TOML configuration for the `progtrack` binary and for hosts embedding the
//! tracker. Sections:
//!
//! - [`TrackerConfig`] - aggregate quest, pass threshold and tick cadence
//! - [`ContentConfig`] - where the JSON content database lives
//! - [`ProfilesConfig`] - where profile snapshots live and how large they may be
//! - [`LoggingConfig`] - level and optional log file
//!
//! ```toml
//! [tracker]
//! aggregate_quest_id = "5c51aac186f77432ea65c552"
//! update_interval_secs = 600
//! tick_interval_ms = 1000
//! log_updates = true
//!
//! [content]
//! data_dir = "./data/content"
//!
//! [profiles]
//! dir = "./data/profiles"
//! max_profile_bytes = 8388608
//!
//! [logging]
//! level = "info"
//! file = "progtrack.log"
//! ```
//!
//! Every section may be omitted; missing values take their defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::profile::json::DEFAULT_MAX_PROFILE_BYTES;
use crate::tracker::DEFAULT_AGGREGATE_QUEST_ID;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_aggregate_quest_id")]
    pub aggregate_quest_id: String,
    /// Seconds between full passes.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    /// How often the driver asks whether a pass is due.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Log each pass and quest transition at info instead of debug.
    #[serde(default = "default_log_updates")]
    pub log_updates: bool,
}

fn default_aggregate_quest_id() -> String {
    DEFAULT_AGGREGATE_QUEST_ID.to_string()
}

fn default_update_interval_secs() -> u64 {
    600
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_updates() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            aggregate_quest_id: default_aggregate_quest_id(),
            update_interval_secs: default_update_interval_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            log_updates: default_log_updates(),
        }
    }
}

impl TrackerConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_dir")]
    pub data_dir: String,
}

fn default_content_dir() -> String {
    "./data/content".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_content_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default = "default_profiles_dir")]
    pub dir: String,
    #[serde(default = "default_max_profile_bytes")]
    pub max_profile_bytes: u64,
}

fn default_profiles_dir() -> String {
    "./data/profiles".to_string()
}

fn default_max_profile_bytes() -> u64 {
    DEFAULT_MAX_PROFILE_BYTES
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            dir: default_profiles_dir(),
            max_profile_bytes: default_max_profile_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to info.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracker.aggregate_quest_id.trim().is_empty() {
            return Err(anyhow!("tracker.aggregate_quest_id must not be empty"));
        }
        if self.tracker.update_interval_secs == 0 {
            return Err(anyhow!("tracker.update_interval_secs must be greater than 0"));
        }
        if self.tracker.tick_interval_ms == 0 {
            return Err(anyhow!("tracker.tick_interval_ms must be greater than 0"));
        }
        if self.profiles.max_profile_bytes == 0 {
            return Err(anyhow!("profiles.max_profile_bytes must be greater than 0"));
        }
        Ok(())
    }
}
