//! Player configuration

use crate::recording::RecordingContainer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Volume the player starts with (0.0 - 1.0)
    pub initial_volume: f64,
    /// Seconds skipped by the arrow-key shortcuts
    pub seek_step: f64,
    /// Playback rates offered by the rate picker
    pub playback_rates: Vec<f64>,
    /// Prefix of every per-video persistence key
    pub storage_namespace: String,
    /// File extensions that mark an adaptive-stream manifest
    pub stream_extensions: Vec<String>,
    /// Container produced by the recorder
    pub recording_container: RecordingContainer,
    /// Ignore shortcuts while a text input has focus
    pub suppress_shortcuts_in_text_input: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            seek_step: 5.0,
            playback_rates: vec![0.5, 1.0, 1.5, 2.0],
            storage_namespace: "video".to_string(),
            stream_extensions: vec!["m3u8".to_string()],
            recording_container: RecordingContainer::WebM,
            suppress_shortcuts_in_text_input: true,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(Error::InvalidConfig(format!(
                "initial_volume must be within 0..=1, got {}",
                self.initial_volume
            )));
        }
        if !self.seek_step.is_finite() || self.seek_step <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "seek_step must be positive, got {}",
                self.seek_step
            )));
        }
        if self.playback_rates.is_empty() {
            return Err(Error::InvalidConfig("playback_rates is empty".to_string()));
        }
        if let Some(rate) = self
            .playback_rates
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(Error::InvalidConfig(format!("invalid playback rate {}", rate)));
        }
        if self.storage_namespace.is_empty() || self.storage_namespace.contains('-') {
            return Err(Error::InvalidConfig(
                "storage_namespace must be non-empty and must not contain '-'".to_string(),
            ));
        }
        Ok(())
    }
}
