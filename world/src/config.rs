//! World configuration loaded from TOML.

use std::{fs, path::Path};

use isle_core::{Rotation, Zoom};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Map file version written and accepted by this build.
pub const MAP_VERSION: &str = "0.1";

const DEFAULT_MIN_WORLD_SIZE: i32 = 50;
const DEFAULT_MAX_WORLD_SIZE: i32 = 500;

/// Tunables applied when a world is created or loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Smallest accepted world width and height.
    pub min_world_size: i32,
    /// Largest accepted world width and height.
    pub max_world_size: i32,
    /// Zoom in effect after loading.
    pub initial_zoom: Zoom,
    /// World rotation in effect after loading.
    pub initial_rotation: Rotation,
    /// Map file version accepted on load.
    pub map_version: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_world_size: DEFAULT_MIN_WORLD_SIZE,
            max_world_size: DEFAULT_MAX_WORLD_SIZE,
            initial_zoom: Zoom::default(),
            initial_rotation: Rotation::default(),
            map_version: MAP_VERSION.to_owned(),
        }
    }
}

impl WorldConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a configuration from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        if config.min_world_size > config.max_world_size {
            return Err(ConfigError::EmptySizeRange {
                min: config.min_world_size,
                max: config.max_world_size,
            });
        }
        Ok(config)
    }

    /// Whether a world of `width` x `height` respects the configured limits.
    #[must_use]
    pub fn accepts_world_size(&self, width: i32, height: i32) -> bool {
        let range = self.min_world_size..=self.max_world_size;
        range.contains(&width) && range.contains(&height)
    }
}
