//! Engine configuration, loaded from YAML

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config yaml")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ticks per second. An explicit `null` runs the loop as fast as it
    /// can go.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: Option<f64>,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The window a demo application opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_tick_rate() -> Option<f64> {
    Some(60.0)
}

fn default_title() -> String {
    "tickwork".to_string()
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
            window: WindowConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.level)
            .map_err(|_| ConfigError::Validation(format!("unknown log level {:?}", self.level)))
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_yaml()?).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hz) = self.tick_rate_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "tick_rate_hz must be positive, got {hz}"
                )));
            }
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Validation(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config = EngineConfig::from_yaml_str("tick_rate_hz: 30\n").unwrap();
        assert_eq!(config.tick_rate_hz, Some(30.0));
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.logging.level, "info");

        let config = EngineConfig::from_yaml_str("window:\n  title: demo\n").unwrap();
        assert_eq!(config.tick_rate_hz, EngineConfig::default().tick_rate_hz);
        assert_eq!(config.window.title, "demo");
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_explicit_null_tick_rate_runs_unpaced() {
        let config = EngineConfig::from_yaml_str("tick_rate_hz: null\n").unwrap();
        assert_eq!(config.tick_rate_hz, None);

        let reloaded = EngineConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded.tick_rate_hz, None);

        let config = EngineConfig::from_yaml_str("{}\n").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");

        let mut config = EngineConfig::default();
        config.window.title = "round trip".to_string();
        config.logging.level = "debug".to_string();
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_yaml_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml_str("tick_rate_hz: 0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("window:\n  width: 0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("logging:\n  level: loud\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("tick_rate_hz: [1, 2]\n"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_path("/nonexistent/engine.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
