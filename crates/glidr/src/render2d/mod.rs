//! # Render2d — Immediate-Mode Drawing
//!
//! Game objects are drawn through a single primitive, [`draw_transform`],
//! which reconciles three coordinate sources: the object's own position and
//! rotation, the visual scale, and the anchor correction left behind by a
//! physics body ([`GameObject::body_offset`](crate::object::GameObject::body_offset)).
//!
//! ## Transform Order
//!
//! ```text
//!   translate(x, y)                 origin moves to the object position
//!        │
//!   rotate(rotation°)               clockwise on screen (y down)
//!        │
//!   translate(-offset.x/2, -offset.y/2)
//!        │                          re-centre a physics body's sprite
//!   scale(sx, sy)
//!        │
//!   image drawn at (0, 0) with (width, height)
//! ```
//!
//! For objects without a body the offset is zero and the sprite hangs from
//! the object position like a top-left anchored image.
//!
//! ## Targets
//!
//! Anything that implements [`Canvas`] can receive a frame. [`DrawList`]
//! records commands (handy for tests and for GPU backends that batch
//! themselves) and [`ImageCanvas`] rasterizes straight into an
//! [`image::RgbaImage`].
//!
//! ## Scratch Lines
//!
//! Update and physics hooks can queue line segments into a [`LineQueue`].
//! The engine flushes the queue after the GUI pass and empties it, so a line
//! is visible only in the frame it was queued in.

pub(crate) mod debug_wireframe;
pub mod raster;

pub use raster::ImageCanvas;

use serde::{Deserialize, Serialize};

use crate::math::{Affine2, Vec2, deg_to_rad};
use crate::sprite::{Sprite, SpriteHandle};

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const RED: Self = Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Self = Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Self = Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub(crate) fn to_rgba8(self) -> [u8; 4] {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b), c(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A line segment request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Color,
    pub width: f32,
}

impl Line {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) -> Self {
        Self {
            from: Vec2::new(x1, y1),
            to: Vec2::new(x2, y2),
            color,
            width,
        }
    }
}

/// Per-frame scratch queue of line segments.
#[derive(Debug, Default)]
pub struct LineQueue {
    lines: Vec<Line>,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Draw every queued line onto `canvas` and empty the queue.
    pub fn flush(&mut self, canvas: &mut dyn Canvas) -> usize {
        let count = self.lines.len();
        for line in self.lines.drain(..) {
            canvas.draw_line(&line);
        }
        count
    }
}

/// A 2D drawing surface.
pub trait Canvas {
    /// Start a new frame.
    fn clear(&mut self, color: Color);

    /// Draw `sprite` stretched over the local rectangle `(0, 0)..size`,
    /// mapped to the surface by `transform`.
    fn draw_sprite(&mut self, handle: SpriteHandle, sprite: &Sprite, transform: Affine2, size: Vec2);

    fn draw_line(&mut self, line: &Line);
}

/// Compose the draw transform for a game object.
///
/// `body_offset` is the unscaled anchor correction; pass [`Vec2::ZERO`] for
/// objects without a physics body.
pub fn draw_transform(position: Vec2, rotation_deg: f32, scale: Vec2, body_offset: Vec2) -> Affine2 {
    Affine2::from_translation(position)
        * Affine2::from_angle(deg_to_rad(rotation_deg))
        * Affine2::from_translation(-body_offset * 0.5)
        * Affine2::from_scale(scale)
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Sprite {
        handle: SpriteHandle,
        transform: Affine2,
        size: Vec2,
    },
    Line(Line),
}

/// A canvas that records commands instead of drawing.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line(line) => Some(line),
            _ => None,
        })
    }

    pub fn sprites(&self) -> impl Iterator<Item = (SpriteHandle, Affine2, Vec2)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::Sprite {
                handle,
                transform,
                size,
            } => Some((handle, transform, size)),
            _ => None,
        })
    }
}

impl Canvas for DrawList {
    /// Drops the previous frame's commands.
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_sprite(&mut self, handle: SpriteHandle, _sprite: &Sprite, transform: Affine2, size: Vec2) {
        self.commands.push(DrawCommand::Sprite {
            handle,
            transform,
            size,
        });
    }

    fn draw_line(&mut self, line: &Line) {
        self.commands.push(DrawCommand::Line(*line));
    }
}
