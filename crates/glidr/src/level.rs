//! Level loading.
//!
//! Levels come from the editor as JSON:
//!
//! ```json
//! { "gameObjects": [
//!     { "x": 10, "y": 20, "rotation": 0, "scaleX": 1, "scaleY": 1,
//!       "name": "rock", "imageName": "rock", "imageB64": "data:image/png;base64,..." }
//! ] }
//! ```
//!
//! [`LevelLoader`] parses that list and makes sure every distinct
//! `imageName` is in the [`SpriteStore`] before handing the records back.
//! Images come from the embedded `imageB64` payload when present, otherwise
//! from `<image_dir>/<imageName>.png`.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sprite::{SpriteError, SpriteStore};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid level data: {source}")]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
    #[error("image '{image}' has invalid base64 data: {source}")]
    Base64 {
        image: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error(transparent)]
    Sprite(#[from] SpriteError),
}

fn one() -> f32 {
    1.0
}

/// One placed object in a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelObject {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default)]
    pub name: String,
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelFile {
    #[serde(default)]
    game_objects: Vec<LevelObject>,
}

/// Reads level files and loads the images they reference.
#[derive(Debug, Clone, Default)]
pub struct LevelLoader {
    image_dir: Option<PathBuf>,
}

impl LevelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory searched for `<imageName>.png` when a record has no
    /// embedded image.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// Parse level JSON without touching images.
    pub fn parse(source: &str) -> Result<Vec<LevelObject>, LevelError> {
        let file: LevelFile =
            serde_json::from_str(source).map_err(|source| LevelError::Parse { path: None, source })?;
        Ok(file.game_objects)
    }

    /// Parse level JSON and load its images.
    pub fn load_str(&self, source: &str, sprites: &mut SpriteStore) -> Result<Vec<LevelObject>, LevelError> {
        let objects = Self::parse(source)?;
        self.ensure_images(&objects, sprites)?;
        Ok(objects)
    }

    /// Read a level file and load its images.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        sprites: &mut SpriteStore,
    ) -> Result<Vec<LevelObject>, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LevelFile = serde_json::from_str(&text).map_err(|source| LevelError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        self.ensure_images(&file.game_objects, sprites)?;
        log::info!("loaded level {} ({} objects)", path.display(), file.game_objects.len());
        Ok(file.game_objects)
    }

    /// Load every distinct image referenced by `objects` that the store does
    /// not have yet. Images with no source are skipped with a warning.
    pub fn ensure_images(&self, objects: &[LevelObject], sprites: &mut SpriteStore) -> Result<(), LevelError> {
        for object in objects {
            let name = object.image_name.as_str();
            if name.is_empty() || sprites.contains(name) {
                continue;
            }
            if let Some(encoded) = object.image_b64.as_deref() {
                let bytes = decode_image_b64(encoded).map_err(|source| LevelError::Base64 {
                    image: name.to_string(),
                    source,
                })?;
                sprites.load_from_memory(name, &bytes)?;
            } else if let Some(dir) = &self.image_dir {
                sprites.load(name, dir.join(format!("{name}.png")))?;
            } else {
                log::warn!("level image '{name}' has no embedded data and no image directory is set");
            }
        }
        Ok(())
    }
}

/// Decode a base64 image, accepting a `data:<mime>;base64,` prefix.
fn decode_image_b64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => encoded,
    };
    BASE64_STANDARD.decode(payload.trim())
}
