use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: Defaults,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub mirror_mode: bool,
    pub library_path: String,
    pub model_path: String,
    /// Minimum hand presence score reported by the landmark model.
    pub presence_threshold: f32,
    /// Frame grabs that may fail in a row before the session gives up.
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_title: String,
    pub landmark_dot_size: usize,
    pub landmark_color_hex: String, // e.g. "#FF0000"
    pub connection_color_hex: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            mirror_mode: false,
            library_path: "stored.json".to_string(),
            model_path: "hand_landmark.onnx".to_string(),
            presence_threshold: 0.5,
            max_consecutive_failures: 30,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "Rusty Hands".to_string(),
            landmark_dot_size: 3,
            landmark_color_hex: "#FF0000".to_string(),
            connection_color_hex: "#FFFFFF".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    pub const PATH: &'static str = "config.json";

    /// Loads the config at `path`, falling back to defaults when the file is
    /// missing or unreadable, then writes it back so new fields show up.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // missing fields are filled in by #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        config.save(path)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_config_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"defaults": {"library_path": "gestures.json"}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.defaults.library_path, "gestures.json");
        assert_eq!(config.defaults.max_consecutive_failures, 30);
        assert_eq!(config.ui, UiConfig::default());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("landmark_color_hex"));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }
}
