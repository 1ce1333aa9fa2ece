//! Sprite store — decoded images addressed by name.
//!
//! Sprites are loaded once (from disk or from an in-memory encoded buffer) and
//! looked up by name afterwards. A [`SpriteHandle`] is an index into the store;
//! reloading a name replaces the pixels in place so existing handles keep
//! pointing at the current image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use crate::math::Vec2;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to load sprite '{name}' from {path}: {source}")]
    Load {
        name: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to decode sprite '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Index of a sprite inside a [`SpriteStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub(crate) u32);

/// A decoded RGBA image.
#[derive(Debug, Clone)]
pub struct Sprite {
    name: String,
    image: RgbaImage,
}

impl Sprite {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native pixel width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Native pixel height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Native size as a float vector.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Name-keyed sprite storage.
#[derive(Debug, Default)]
pub struct SpriteStore {
    sprites: Vec<Sprite>,
    by_name: HashMap<String, SpriteHandle>,
}

impl SpriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an image file and store it under `name`.
    pub fn load(&mut self, name: &str, path: impl AsRef<Path>) -> Result<SpriteHandle, SpriteError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| SpriteError::Load {
                name: name.to_string(),
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        log::debug!("loaded sprite '{name}' ({}x{}) from {}", image.width(), image.height(), path.display());
        Ok(self.insert(name, image))
    }

    /// Decode an encoded image (PNG/JPEG bytes) and store it under `name`.
    pub fn load_from_memory(&mut self, name: &str, bytes: &[u8]) -> Result<SpriteHandle, SpriteError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| SpriteError::Decode {
                name: name.to_string(),
                source,
            })?
            .to_rgba8();
        Ok(self.insert(name, image))
    }

    /// Store already-decoded pixels under `name`, replacing any previous
    /// image of that name while keeping its handle.
    pub fn insert(&mut self, name: &str, image: RgbaImage) -> SpriteHandle {
        let sprite = Sprite {
            name: name.to_string(),
            image,
        };
        if let Some(&handle) = self.by_name.get(name) {
            self.sprites[handle.0 as usize] = sprite;
            return handle;
        }
        let handle = SpriteHandle(self.sprites.len() as u32);
        self.sprites.push(sprite);
        self.by_name.insert(name.to_string(), handle);
        handle
    }

    /// Look up a sprite by name.
    pub fn get(&self, name: &str) -> Option<SpriteHandle> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Resolve a handle to its image.
    pub fn sprite(&self, handle: SpriteHandle) -> Option<&Sprite> {
        self.sprites.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
