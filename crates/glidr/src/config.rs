//! Engine configuration.
//!
//! [`EngineConfig`] is plain serde data. Build it in code with the `with_*`
//! helpers or load it from a JSON file; missing fields fall back to defaults.
//!
//! ```ignore
//! let config = EngineConfig::from_file("engine.json")?.with_debug_physics(true);
//! let engine = Engine::new(config);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec2;
use crate::render2d::Color;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid engine config: {source}")]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunables for the frame loop, physics and debug drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gravity in scene units per second squared. Screen space, y points down.
    pub gravity: [f32; 2],
    /// Length of one physics step in seconds.
    pub fixed_timestep: f32,
    /// Frame deltas are capped to this many seconds before feeding the
    /// physics accumulator.
    pub max_frame_delta: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    pub clear_color: Color,
    /// Draw physics body outlines after the entity render pass.
    pub debug_physics: bool,
    pub debug_color: Color,
}

impl EngineConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|source| ConfigError::Parse { path: None, source })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity.to_array();
        self
    }

    pub fn with_debug_physics(mut self, enabled: bool) -> Self {
        self.debug_physics = enabled;
        self
    }

    pub fn with_screen_size(mut self, width: f32, height: f32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 1000.0],
            fixed_timestep: 1.0 / 60.0,
            max_frame_delta: 0.25,
            screen_width: 800.0,
            screen_height: 600.0,
            clear_color: Color::BLACK,
            debug_physics: false,
            debug_color: Color::GREEN,
        }
    }
}
