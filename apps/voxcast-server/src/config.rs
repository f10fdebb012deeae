//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides,
//! following the same defaults -> file -> env layering as the core's own
//! [`voxcast_core::Config`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Minutes of voice-channel inactivity before a guild's player
    /// disconnects. Override: `VOXCAST_IDLE_TIMEOUT_MINUTES`.
    pub idle_timeout_minutes: u64,

    /// Max items accepted from one collection enqueue.
    /// Override: `VOXCAST_PLAYLIST_LIMIT`.
    pub playlist_limit: usize,

    /// Opus target bitrate. Override: `VOXCAST_AUDIO_BITRATE`.
    pub audio_bitrate: u32,

    /// Enable the radio auto-queue when a guild's queue drains.
    /// Override: `VOXCAST_RADIO_ENABLED`.
    pub radio_enabled: bool,

    /// Ring-buffer capacity for play history.
    /// Override: `VOXCAST_HISTORY_SIZE`.
    pub history_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = voxcast_core::Config::default();
        Self {
            idle_timeout_minutes: core.idle_timeout_minutes,
            playlist_limit: core.playlist_limit,
            audio_bitrate: core.audio_bitrate,
            radio_enabled: core.radio_enabled,
            history_size: core.history_size,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VOXCAST_IDLE_TIMEOUT_MINUTES") {
            if let Ok(parsed) = val.parse() {
                self.idle_timeout_minutes = parsed;
            }
        }
        if let Ok(val) = std::env::var("VOXCAST_PLAYLIST_LIMIT") {
            if let Ok(parsed) = val.parse() {
                self.playlist_limit = parsed;
            }
        }
        if let Ok(val) = std::env::var("VOXCAST_AUDIO_BITRATE") {
            if let Ok(parsed) = val.parse() {
                self.audio_bitrate = parsed;
            }
        }
        if let Ok(val) = std::env::var("VOXCAST_RADIO_ENABLED") {
            if let Ok(parsed) = val.parse() {
                self.radio_enabled = parsed;
            }
        }
        if let Ok(val) = std::env::var("VOXCAST_HISTORY_SIZE") {
            if let Ok(parsed) = val.parse() {
                self.history_size = parsed;
            }
        }
    }

    /// Converts to `voxcast-core`'s `Config` type, clamping/validating as it does.
    pub fn to_core_config(&self) -> Result<voxcast_core::Config> {
        voxcast_core::Config::new(
            self.idle_timeout_minutes,
            self.playlist_limit,
            self.audio_bitrate,
            self.radio_enabled,
            self.history_size,
        )
        .context("Invalid configuration")
    }
}
