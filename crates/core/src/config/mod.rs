//! Configuration for the event subsystem
//!
//! Settings live in a TOML file. Missing files are created with defaults,
//! missing keys fall back to their defaults.
//!
//! # Example
//!
//! ```ignore
//! use tidings_core::EventsConfig;
//!
//! let config = EventsConfig::load("config/events.toml")?;
//! let clock = tidings_core::time::GameClock::new(&config.clock);
//! ```
//!
//! ```toml
//! version = 1
//! script_prefix = "game_events."
//!
//! [clock]
//! scale = 5.0
//! resolution = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Game clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Update cycles per second of game time
    pub scale: f32,

    /// Game seconds between two time events
    pub resolution: u16,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            scale: 5.0,
            resolution: 1,
        }
    }
}

/// Event subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Prepended to script paths of scripted reactions
    pub script_prefix: String,

    pub clock: ClockConfig,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            script_prefix: "game_events.".to_string(),
            clock: ClockConfig::default(),
        }
    }
}

impl EventsConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file, creating default if missing.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded events config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default events config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved events config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded events config from {:?}", path);
        Ok(())
    }
}
