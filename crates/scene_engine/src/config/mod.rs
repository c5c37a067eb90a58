//! Configuration system
//!
//! Engine configuration is plain serde data loaded from RON or TOML files.
//! Subsystems receive their config struct explicitly; there are no global
//! configuration singletons.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error while reading or writing a config file
    #[error("config io error: {0}")]
    Io(std::io::Error),

    /// Parse error in a config file
    #[error("config parse error: {0}")]
    Parse(String),

    /// Serialization error while saving
    #[error("config serialize error: {0}")]
    Serialize(String),

    /// File extension not recognized (expected .ron or .toml)
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Physics simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World gravity acceleration, units per second squared
    pub gravity: Vec3,

    /// Fixed simulation timestep in seconds
    pub timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -20.0, 0.0),
            timestep: 1.0 / 60.0,
        }
    }
}

impl Config for PhysicsConfig {}
