use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Tunables for a playground session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaygroundConfig {
    /// Datasource assigned when a payload does not name one
    #[serde(default = "default_datasource")]
    pub default_datasource: String,

    /// Capacity of the channel between job runner and consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Pause between replayed log lines (milliseconds)
    #[serde(default)]
    pub replay_delay_ms: u64,

    /// Distance from the bottom of the log view that still counts as "at bottom"
    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: u32,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            default_datasource: default_datasource(),
            channel_capacity: default_channel_capacity(),
            replay_delay_ms: 0,
            scroll_threshold_px: default_scroll_threshold_px(),
        }
    }
}

fn default_datasource() -> String {
    "npm".to_string()
}

fn default_channel_capacity() -> usize {
    64
}

fn default_scroll_threshold_px() -> u32 {
    5
}

impl PlaygroundConfig {
    /// Load settings from a JSON file; omitted keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.default_datasource.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_datasource must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_take_defaults() {
        let config: PlaygroundConfig = serde_json::from_str(r#"{"replay_delay_ms": 25}"#).unwrap();
        assert_eq!(config.replay_delay_ms, 25);
        assert_eq!(config.default_datasource, "npm");
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.scroll_threshold_px, 5);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PlaygroundConfig {
            channel_capacity: 0,
            ..PlaygroundConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!(
            "playground_settings_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"default_datasource": "maven"}"#).unwrap();

        let config = PlaygroundConfig::from_file(&path).unwrap();
        assert_eq!(config.default_datasource, "maven");

        std::fs::remove_file(path).ok();
    }
}
