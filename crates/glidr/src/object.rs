//! Game objects — the entities a scene is made of.
//!
//! A [`GameObject`] carries a transform (top-left anchored position, depth,
//! rotation in degrees, non-uniform scale), a logical size used for
//! hit-testing and drawing, an optional sprite and an optional rigid body.
//! Per-object logic lives in a [`Behavior`] implementation whose hooks all
//! default to no-ops.
//!
//! ## Body anchoring
//!
//! Physics bodies are centred on their centroid while objects are authored
//! from their top-left corner. [`GameObject::set_rigid_body`] places the body
//! at `(x + w/2, y + h/2)` and records the effective body size as
//! [`body_offset`](GameObject::body_offset). The draw pipeline shifts the
//! sprite back by half that offset after rotating, so the sprite stays
//! centred on the body once the object's position tracks the centroid.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::Context;
use crate::math::{Vec2, deg_to_rad, rad_to_deg, round3_vec};
use crate::physics2d::{BodyDesc, BodyHandle, BodyShape, PhysicsWorld2d};
use crate::render2d::{Canvas, draw_transform};
use crate::sprite::{SpriteHandle, SpriteStore};

// ── Identity ────────────────────────────────────────────────────────────

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identifier, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

// ── Body specification ──────────────────────────────────────────────────

/// A body dimension: an explicit value, or derived from the object's size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    Value(f32),
}

impl Dimension {
    fn resolve(self, auto: f32) -> f32 {
        match self {
            Dimension::Auto => auto,
            Dimension::Value(v) => v,
        }
    }
}

impl From<f32> for Dimension {
    fn from(v: f32) -> Self {
        Dimension::Value(v)
    }
}

/// Requested body shape. Dimensions are unscaled; the object's scale is
/// applied when the body is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeSpec {
    Box { width: Dimension, height: Dimension },
    Circle { radius: Dimension },
}

/// Everything [`GameObject::set_rigid_body`] needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub shape: ShapeSpec,
    pub is_static: bool,
}

impl BodySpec {
    /// A dynamic box.
    pub fn rect(width: impl Into<Dimension>, height: impl Into<Dimension>) -> Self {
        Self {
            shape: ShapeSpec::Box {
                width: width.into(),
                height: height.into(),
            },
            is_static: false,
        }
    }

    /// A dynamic box sized from the object.
    pub fn auto_rect() -> Self {
        Self::rect(Dimension::Auto, Dimension::Auto)
    }

    /// A dynamic circle.
    pub fn circle(radius: impl Into<Dimension>) -> Self {
        Self {
            shape: ShapeSpec::Circle {
                radius: radius.into(),
            },
            is_static: false,
        }
    }

    /// A dynamic circle whose radius is half the object's larger side.
    pub fn auto_circle() -> Self {
        Self::circle(Dimension::Auto)
    }

    /// Make the body immovable.
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }
}

// ── Behavior ────────────────────────────────────────────────────────────

/// Where a collision notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionSource {
    /// The per-frame bounding-box scan over logical sizes.
    BroadPhase,
    /// A physics contact pair that stopped touching.
    Physics,
}

/// Payload of [`Behavior::on_collision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    /// The other object, or `None` if its body belongs to no resident object.
    pub other: Option<ObjectId>,
    pub source: CollisionSource,
}

/// Per-object logic. Every hook defaults to doing nothing, except
/// [`render`](Behavior::render) which draws the object's sprite.
///
/// The [`Context`] gives access to the object itself
/// ([`Context::me`]), the rest of the scene, physics and the draw queue.
///
/// ```ignore
/// struct Thruster;
///
/// impl Behavior for Thruster {
///     fn physics_update(&mut self, ctx: &mut Context) {
///         let dir = ctx.forward_vector(true);
///         ctx.add_force(dir * 5000.0);
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait Behavior {
    fn start(&mut self, ctx: &mut Context) {}

    fn update(&mut self, ctx: &mut Context, delta: f32) {}

    /// Runs before every fixed physics step.
    fn physics_update(&mut self, ctx: &mut Context) {}

    fn on_touch_down(&mut self, ctx: &mut Context) {}

    /// Runs once per frame while a touch is held over the object.
    fn on_touch(&mut self, ctx: &mut Context) {}

    fn on_touch_up(&mut self, ctx: &mut Context) {}

    fn on_collision(&mut self, ctx: &mut Context, collision: Collision) {}

    fn render(&mut self, ctx: &mut Context, canvas: &mut dyn Canvas, delta: f32) {
        ctx.draw_me(canvas);
    }

    fn render_gui(&mut self, ctx: &mut Context, canvas: &mut dyn Canvas, delta: f32) {}
}

/// Stand-in for objects created without a behavior.
pub(crate) struct DefaultBehavior;

impl Behavior for DefaultBehavior {}

// ── GameObject ──────────────────────────────────────────────────────────

/// A positioned, oriented, scaled object with optional sprite and body.
pub struct GameObject {
    id: ObjectId,
    name: String,
    pub x: f32,
    pub y: f32,
    /// Ordering hint only; scenes draw in insertion order.
    pub z: f32,
    /// Degrees, clockwise on screen.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub width: f32,
    pub height: f32,
    /// Copy the body's centroid and angle back every frame.
    pub match_physics: bool,
    sprite: Option<SpriteHandle>,
    body: Option<BodyHandle>,
    body_offset: Vec2,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pos", &(self.x, self.y))
            .field("rotation", &self.rotation)
            .field("scale", &(self.scale_x, self.scale_y))
            .field("size", &(self.width, self.height))
            .field("sprite", &self.sprite)
            .field("body", &self.body)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

impl GameObject {
    /// A 100x100 object at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::next(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width: 100.0,
            height: 100.0,
            match_physics: true,
            sprite: None,
            body: None,
            body_offset: Vec2::ZERO,
            behavior: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_depth(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale_x = sx;
        self.scale_y = sy;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn with_match_physics(mut self, match_physics: bool) -> Self {
        self.match_physics = match_physics;
        self
    }

    /// Replace the behavior. Takes effect from the next hook call.
    pub fn set_behavior(&mut self, behavior: impl Behavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_pos(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }

    /// Logical size used for hit-testing and drawing. Never the body's size.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn sprite(&self) -> Option<SpriteHandle> {
        self.sprite
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Anchor correction handed to the draw pipeline; zero without a body.
    pub fn body_offset(&self) -> Vec2 {
        self.body_offset
    }

    // ── Sprite ──────────────────────────────────────────────────────────

    /// Look up `name` in the store. With `resize`, adopt the sprite's native
    /// size. An unknown name clears the sprite and returns `false`.
    pub fn set_sprite(&mut self, sprites: &SpriteStore, name: &str, resize: bool) -> bool {
        let handle = sprites.get(name);
        self.sprite = handle;
        let Some(sprite) = handle.and_then(|h| sprites.sprite(h)) else {
            log::warn!("object '{}': unknown sprite '{name}'", self.name);
            return false;
        };
        if resize {
            self.width = sprite.width() as f32;
            self.height = sprite.height() as f32;
        }
        true
    }

    // ── Physics ─────────────────────────────────────────────────────────

    /// Create a body from the current transform and attach it. Any previous
    /// body is removed from `physics`. The new body starts disabled; a scene
    /// enables it while it is active.
    ///
    /// Use this on objects that are not in a scene yet. A resident object's
    /// body is tracked by its scene, so replace it through
    /// [`Scene::set_rigid_body`](crate::scene::Scene::set_rigid_body) or
    /// [`Context::set_rigid_body`](crate::context::Context::set_rigid_body).
    pub fn set_rigid_body(&mut self, physics: &mut PhysicsWorld2d, spec: BodySpec) -> BodyHandle {
        if let Some(old) = self.body.take() {
            physics.remove_body(old);
        }

        let (shape, extents) = match spec.shape {
            ShapeSpec::Box { width, height } => {
                let w = width.resolve(self.width) * self.scale_x;
                let h = height.resolve(self.height) * self.scale_y;
                (BodyShape::Box { width: w, height: h }, Vec2::new(w, h))
            }
            ShapeSpec::Circle { radius } => {
                let auto = self.width.max(self.height) * 0.5;
                let r = radius.resolve(auto) * self.scale_x.max(self.scale_y);
                (BodyShape::Circle { radius: r }, Vec2::splat(r * 2.0))
            }
        };

        let handle = physics.create_body(BodyDesc {
            shape,
            is_static: spec.is_static,
            position: self.pos() + extents * 0.5,
            angle: deg_to_rad(self.rotation),
        });
        self.body = Some(handle);
        self.body_offset = extents;
        handle
    }

    /// Detach the body without touching the simulation.
    pub(crate) fn take_body(&mut self) -> Option<BodyHandle> {
        self.body_offset = Vec2::ZERO;
        self.body.take()
    }

    /// Rotate the body, and the object with it. No-op without a body.
    pub fn set_rotation_deg(&mut self, physics: &mut PhysicsWorld2d, degrees: f32) {
        if let Some(body) = self.body {
            physics.set_angle(body, deg_to_rad(degrees));
            self.rotation = degrees;
        }
    }

    /// Radian form of [`set_rotation_deg`](Self::set_rotation_deg).
    pub fn set_rotation_rad(&mut self, physics: &mut PhysicsWorld2d, radians: f32) {
        if let Some(body) = self.body {
            physics.set_angle(body, radians);
            self.rotation = rad_to_deg(radians);
        }
    }

    /// Unit vector the object faces: +X rotated by the current rotation, or
    /// screen-up (0, -1) with `adjust_up`. Components rounded to 3 decimals.
    pub fn forward_vector(&self, adjust_up: bool) -> Vec2 {
        let axis = if adjust_up { Vec2::NEG_Y } else { Vec2::X };
        let dir = Vec2::from_angle(deg_to_rad(self.rotation)).rotate(axis);
        round3_vec(dir.normalize_or_zero())
    }

    /// Body velocity, zero without a body.
    pub fn velocity(&self, physics: &PhysicsWorld2d) -> Vec2 {
        self.body.map(|b| physics.velocity(b)).unwrap_or(Vec2::ZERO)
    }

    /// Push the body through its centroid. No-op without a body.
    pub fn add_force(&self, physics: &mut PhysicsWorld2d, force: Vec2) {
        if let Some(body) = self.body {
            physics.add_force(body, force);
        }
    }

    pub fn add_torque(&self, physics: &mut PhysicsWorld2d, torque: f32) {
        if let Some(body) = self.body {
            physics.add_torque(body, torque);
        }
    }

    /// Copy the body's centroid and angle into the transform when
    /// `match_physics` is set. Returns whether anything was copied.
    pub(crate) fn sync_from_body(&mut self, physics: &PhysicsWorld2d) -> bool {
        if !self.match_physics {
            return false;
        }
        let Some(body) = self.body else {
            return false;
        };
        let (Some(pos), Some(angle)) = (physics.position(body), physics.angle(body)) else {
            return false;
        };
        self.x = pos.x;
        self.y = pos.y;
        self.rotation = rad_to_deg(angle);
        true
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    /// Draw the sprite through the transform pipeline. No-op without a sprite.
    pub fn render(&self, sprites: &SpriteStore, canvas: &mut dyn Canvas) {
        let Some(handle) = self.sprite else {
            return;
        };
        let Some(sprite) = sprites.sprite(handle) else {
            return;
        };
        let transform = draw_transform(self.pos(), self.rotation, self.scale(), self.body_offset);
        canvas.draw_sprite(handle, sprite, transform, self.size());
    }
}
