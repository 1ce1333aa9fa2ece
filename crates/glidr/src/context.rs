//! Context — what a behavior hook can reach.
//!
//! Every [`Behavior`](crate::object::Behavior) hook receives a [`Context`]
//! naming the object being called ([`Context::me`]) and borrowing the scene,
//! the physics world, the sprite store and the per-frame line queue.
//!
//! Hooks may read and mutate objects in place, but cannot add or remove
//! objects directly: [`Context::instantiate`], [`Context::destroy`] and
//! [`Context::load_scene`] queue a [`SceneCommand`] that the engine applies
//! once the update and collision passes are over and before rendering.

use crate::math::Vec2;
use crate::object::{BodySpec, GameObject, ObjectId};
use crate::physics2d::{BodyHandle, PhysicsWorld2d};
use crate::render2d::{Canvas, Color, Line, LineQueue};
use crate::scene::Scene;
use crate::sprite::SpriteStore;

// ── Deferred commands ───────────────────────────────────────────────────

/// A structural scene change requested from inside a hook.
#[derive(Debug)]
pub enum SceneCommand {
    /// Add to the active scene and call `start`.
    Instantiate(GameObject),
    /// Remove from the active scene and retract its body.
    Destroy(ObjectId),
    /// Make a stored scene active.
    LoadScene(String),
}

// ── Services ────────────────────────────────────────────────────────────

/// Engine-owned collaborators lent to a scene for one pass.
pub struct Services<'a> {
    pub physics: &'a mut PhysicsWorld2d,
    pub sprites: &'a SpriteStore,
    pub lines: &'a mut LineQueue,
    pub commands: &'a mut Vec<SceneCommand>,
    pub screen: Vec2,
    /// Latest touch point while a touch is held.
    pub touch: Option<Vec2>,
}

// ── Context ─────────────────────────────────────────────────────────────

/// Handed to every behavior hook.
pub struct Context<'a> {
    me: ObjectId,
    scene: &'a mut Scene,
    physics: &'a mut PhysicsWorld2d,
    sprites: &'a SpriteStore,
    lines: &'a mut LineQueue,
    commands: &'a mut Vec<SceneCommand>,
    screen: Vec2,
    touch: Option<Vec2>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(me: ObjectId, scene: &'a mut Scene, services: &'a mut Services<'_>) -> Self {
        Self {
            me,
            scene,
            physics: &mut *services.physics,
            sprites: services.sprites,
            lines: &mut *services.lines,
            commands: &mut *services.commands,
            screen: services.screen,
            touch: services.touch,
        }
    }

    /// The object whose hook is running.
    pub fn me(&self) -> ObjectId {
        self.me
    }

    /// The running object. `None` only if it was looked up after removal.
    pub fn object(&self) -> Option<&GameObject> {
        self.scene.get(self.me)
    }

    pub fn object_mut(&mut self) -> Option<&mut GameObject> {
        self.scene.get_mut(self.me)
    }

    /// Any object in the scene.
    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.scene.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.scene.get_mut(id)
    }

    /// First object with `name`.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.scene.find(name)
    }

    pub fn scene_name(&self) -> &str {
        self.scene.name()
    }

    pub fn physics(&self) -> &PhysicsWorld2d {
        self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld2d {
        self.physics
    }

    pub fn sprites(&self) -> &SpriteStore {
        self.sprites
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen
    }

    /// Latest touch point while a touch is held.
    pub fn touch_point(&self) -> Option<Vec2> {
        self.touch
    }

    // ── Operations on the running object ────────────────────────────────

    /// See [`GameObject::set_sprite`].
    pub fn set_sprite(&mut self, name: &str, resize: bool) -> bool {
        let sprites = self.sprites;
        self.scene
            .get_mut(self.me)
            .map(|obj| obj.set_sprite(sprites, name, resize))
            .unwrap_or(false)
    }

    /// Give the running object a body; the scene enables it when active.
    pub fn set_rigid_body(&mut self, spec: BodySpec) -> Option<BodyHandle> {
        self.scene.set_rigid_body(self.physics, self.me, spec)
    }

    pub fn set_rotation_deg(&mut self, degrees: f32) {
        if let Some(obj) = self.scene.get_mut(self.me) {
            obj.set_rotation_deg(self.physics, degrees);
        }
    }

    pub fn set_rotation_rad(&mut self, radians: f32) {
        if let Some(obj) = self.scene.get_mut(self.me) {
            obj.set_rotation_rad(self.physics, radians);
        }
    }

    pub fn forward_vector(&self, adjust_up: bool) -> Vec2 {
        self.object()
            .map(|obj| obj.forward_vector(adjust_up))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn velocity(&self) -> Vec2 {
        self.object()
            .map(|obj| obj.velocity(self.physics))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn add_force(&mut self, force: Vec2) {
        if let Some(obj) = self.scene.get(self.me) {
            obj.add_force(self.physics, force);
        }
    }

    pub fn add_torque(&mut self, torque: f32) {
        if let Some(obj) = self.scene.get(self.me) {
            obj.add_torque(self.physics, torque);
        }
    }

    /// Draw the running object's sprite (the default `render` hook).
    pub fn draw_me(&self, canvas: &mut dyn Canvas) {
        if let Some(obj) = self.object() {
            obj.render(self.sprites, canvas);
        }
    }

    // ── Immediate-mode lines ────────────────────────────────────────────

    /// Queue a line for this frame only.
    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) {
        self.lines.push(Line::new(x1, y1, x2, y2, color, width));
    }

    // ── Deferred structure changes ──────────────────────────────────────

    /// Spawn into the active scene once the current pass finishes.
    pub fn instantiate(&mut self, object: GameObject) -> ObjectId {
        let id = object.id();
        self.commands.push(SceneCommand::Instantiate(object));
        id
    }

    pub fn destroy(&mut self, id: ObjectId) {
        self.commands.push(SceneCommand::Destroy(id));
    }

    pub fn destroy_me(&mut self) {
        self.destroy(self.me);
    }

    pub fn load_scene(&mut self, name: impl Into<String>) {
        self.commands.push(SceneCommand::LoadScene(name.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        physics: PhysicsWorld2d,
        sprites: SpriteStore,
        lines: LineQueue,
        commands: Vec<SceneCommand>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                physics: PhysicsWorld2d::new(),
                sprites: SpriteStore::new(),
                lines: LineQueue::new(),
                commands: Vec::new(),
            }
        }

        fn services(&mut self) -> Services<'_> {
            Services {
                physics: &mut self.physics,
                sprites: &self.sprites,
                lines: &mut self.lines,
                commands: &mut self.commands,
                screen: Vec2::new(800.0, 600.0),
                touch: None,
            }
        }
    }

    #[test]
    fn structure_changes_are_deferred() {
        let mut h = Harness::new();
        let mut scene = Scene::new("main");
        let me = scene.add_silently(&mut h.physics, GameObject::new("spawner"));

        let spawned = {
            let mut services = h.services();
            let mut ctx = Context::new(me, &mut scene, &mut services);
            ctx.destroy_me();
            ctx.load_scene("next");
            ctx.instantiate(GameObject::new("child"))
        };

        assert_eq!(scene.len(), 1);
        assert_eq!(h.commands.len(), 3);
        assert!(matches!(h.commands[0], SceneCommand::Destroy(id) if id == me));
        assert!(matches!(&h.commands[1], SceneCommand::LoadScene(name) if name == "next"));
        assert!(matches!(&h.commands[2], SceneCommand::Instantiate(obj) if obj.id() == spawned));
    }

    #[test]
    fn lines_and_forces_reach_services() {
        let mut h = Harness::new();
        let mut scene = Scene::new("main");
        scene.set_active(&mut h.physics, true);
        let me = scene.add_silently(&mut h.physics, GameObject::new("ship"));

        {
            let mut services = h.services();
            let mut ctx = Context::new(me, &mut scene, &mut services);
            assert!(ctx.set_rigid_body(BodySpec::auto_rect()).is_some());
            ctx.draw_line(0.0, 0.0, 5.0, 5.0, Color::RED, 1.0);
            ctx.set_rotation_deg(90.0);
            assert_eq!(ctx.forward_vector(false), Vec2::new(0.0, 1.0));
        }

        assert_eq!(h.lines.len(), 1);
        let body = scene.get(me).and_then(|o| o.body()).unwrap();
        assert!(h.physics.is_enabled(body));
        assert_eq!(scene.object_for_body(body), Some(me));
    }
}
