//! Core application configuration.
//!
//! All fields have sensible defaults and are validated on construction,
//! following the teacher's `StreamingConfig::new`/`validate` pattern.

use serde::{Deserialize, Serialize};

use crate::error::{VoxError, VoxResult};

const MAX_PLAYLIST_LIMIT: usize = 50;
const MIN_BITRATE: u32 = 8_000;
const MAX_BITRATE: u32 = 512_000;

/// Configuration for the Voxcast playback runtime (§6/§12).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Disconnect from voice after this many minutes idle.
    pub idle_timeout_minutes: u64,

    /// Max items accepted from one collection enqueue (clamped to [1, 50]).
    pub playlist_limit: usize,

    /// Opus target bitrate (clamped to [8_000, 512_000]).
    pub audio_bitrate: u32,

    /// Enable the radio auto-queue when a guild's queue drains.
    pub radio_enabled: bool,

    /// Ring-buffer capacity for play history.
    pub history_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 20,
            playlist_limit: 15,
            audio_bitrate: 128_000,
            radio_enabled: false,
            history_size: 50,
        }
    }
}

impl Config {
    /// Creates a new `Config`, clamping permissive fields and rejecting
    /// values that can never be made sensible.
    ///
    /// # Errors
    ///
    /// Returns [`VoxError::Config`] if `idle_timeout_minutes` or
    /// `history_size` is zero.
    pub fn new(
        idle_timeout_minutes: u64,
        playlist_limit: usize,
        audio_bitrate: u32,
        radio_enabled: bool,
        history_size: usize,
    ) -> VoxResult<Self> {
        let config = Self {
            idle_timeout_minutes,
            playlist_limit: playlist_limit.clamp(1, MAX_PLAYLIST_LIMIT),
            audio_bitrate: audio_bitrate.clamp(MIN_BITRATE, MAX_BITRATE),
            radio_enabled,
            history_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`VoxError::Config`] if a value would cause runtime issues.
    pub fn validate(&self) -> VoxResult<()> {
        if self.idle_timeout_minutes == 0 {
            return Err(VoxError::Config {
                reason: "idle_timeout_minutes must be >= 1".to_string(),
            });
        }
        if self.history_size == 0 {
            return Err(VoxError::Config {
                reason: "history_size must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_timeout_minutes, 20);
        assert_eq!(config.playlist_limit, 15);
        assert_eq!(config.audio_bitrate, 128_000);
        assert!(!config.radio_enabled);
        assert_eq!(config.history_size, 50);
    }

    #[test]
    fn new_clamps_playlist_limit_and_bitrate() {
        let config = Config::new(20, 999, 1, false, 50).unwrap();
        assert_eq!(config.playlist_limit, 50);
        assert_eq!(config.audio_bitrate, MIN_BITRATE);

        let config = Config::new(20, 0, 10_000_000, false, 50).unwrap();
        assert_eq!(config.playlist_limit, 1);
        assert_eq!(config.audio_bitrate, MAX_BITRATE);
    }

    #[test]
    fn new_rejects_zero_idle_timeout() {
        assert!(Config::new(0, 15, 128_000, false, 50).is_err());
    }

    #[test]
    fn new_rejects_zero_history_size() {
        assert!(Config::new(20, 15, 128_000, false, 0).is_err());
    }
}
