//! Convenience re-exports — `use glidr::prelude::*` for the common items.

// Core
pub use crate::config::EngineConfig;
pub use crate::context::{Context, SceneCommand};
pub use crate::engine::{Engine, FrameStats};
pub use crate::input::{InputManager, TouchEvent};
pub use crate::math::{Aabb, Affine2, Vec2};
pub use crate::object::{Behavior, BodySpec, Collision, CollisionSource, Dimension, GameObject, ObjectId};
pub use crate::scene::{Scene, SceneManager};
pub use crate::time::Time;

// Assets
pub use crate::level::{LevelLoader, LevelObject};
pub use crate::sprite::{Sprite, SpriteHandle, SpriteStore};

// Physics
pub use crate::physics2d::{BodyHandle, BodyShape, PhysicsWorld2d};

// Rendering
pub use crate::render2d::{Canvas, Color, DrawList, ImageCanvas, Line};
