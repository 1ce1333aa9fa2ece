//! # Scenes — Ordered Object Collections
//!
//! A [`Scene`] owns its [`GameObject`]s in insertion order. That order is the
//! update order and the draw order; `z` is not sorted on.
//!
//! ## Lifecycle
//!
//! ```text
//!   add_silently ──► resident (no start)
//!   instantiate  ──► resident + start
//!   load_scene   ──► start on every resident, bodies enabled
//!   swapped out  ──► bodies disabled, objects kept
//!   destroy      ──► removed, body retracted from the world
//! ```
//!
//! Bodies only simulate while their scene is active. Silent insertion into a
//! scene that has not been loaded yet registers the body but keeps it
//! disabled, so level population can happen up front without side effects.
//!
//! ## Hook dispatch
//!
//! [`Scene::call`] takes an object's behavior out, runs one hook with a
//! [`Context`], and puts the behavior back. Passes iterate over a snapshot of
//! ids so hooks can freely touch other objects.

use std::collections::HashMap;

use crate::context::{Context, Services};
use crate::object::{Behavior, BodySpec, DefaultBehavior, GameObject, ObjectId};
use crate::physics2d::{BodyHandle, PhysicsWorld2d};
use crate::render2d::Canvas;

// ── Scene ───────────────────────────────────────────────────────────────

/// An ordered, mutable collection of game objects.
#[derive(Debug)]
pub struct Scene {
    name: String,
    objects: Vec<GameObject>,
    index: HashMap<ObjectId, usize>,
    bodies: HashMap<BodyHandle, ObjectId>,
    active: bool,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            index: HashMap::new(),
            bodies: HashMap::new(),
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.index.get(&id).map(|&i| &mut self.objects[i])
    }

    /// First object named `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().find(|o| o.name() == name).map(|o| o.id())
    }

    /// Snapshot of ids in insertion order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.iter_mut()
    }

    /// The object owning `body`, if it lives in this scene.
    pub fn object_for_body(&self, body: BodyHandle) -> Option<ObjectId> {
        self.bodies.get(&body).copied()
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Append without calling `start`. The object's body (if any) is
    /// registered and enabled only when the scene is active.
    pub fn add_silently(&mut self, physics: &mut PhysicsWorld2d, object: GameObject) -> ObjectId {
        let id = object.id();
        if let Some(body) = object.body() {
            self.bodies.insert(body, id);
            physics.set_enabled(body, self.active);
        }
        self.index.insert(id, self.objects.len());
        self.objects.push(object);
        id
    }

    /// Append and call `start`.
    pub fn instantiate(&mut self, object: GameObject, services: &mut Services<'_>) -> ObjectId {
        let id = self.add_silently(services.physics, object);
        self.call(id, services, |b, ctx| b.start(ctx));
        id
    }

    /// Remove an object and retract its body from the world.
    pub fn remove(&mut self, physics: &mut PhysicsWorld2d, id: ObjectId) -> Option<GameObject> {
        let idx = self.index.remove(&id)?;
        let mut object = self.objects.remove(idx);
        for (i, obj) in self.objects.iter().enumerate().skip(idx) {
            self.index.insert(obj.id(), i);
        }
        if let Some(body) = object.take_body() {
            self.bodies.remove(&body);
            physics.remove_body(body);
        }
        Some(object)
    }

    /// Attach a new body to a resident object, replacing and retracting the
    /// old one.
    pub fn set_rigid_body(
        &mut self,
        physics: &mut PhysicsWorld2d,
        id: ObjectId,
        spec: BodySpec,
    ) -> Option<BodyHandle> {
        let active = self.active;
        let object = self.get_mut(id)?;
        let old = object.body();
        let body = object.set_rigid_body(physics, spec);
        if let Some(old) = old {
            self.bodies.remove(&old);
        }
        self.bodies.insert(body, id);
        physics.set_enabled(body, active);
        Some(body)
    }

    /// Mark the scene (in)active and switch its bodies on or off.
    pub fn set_active(&mut self, physics: &mut PhysicsWorld2d, active: bool) {
        self.active = active;
        for body in self.bodies.keys() {
            physics.set_enabled(*body, active);
        }
    }

    // ── Hook dispatch ───────────────────────────────────────────────────

    /// Run one behavior hook for `id`. Returns `false` if the object is not
    /// resident. Objects without a behavior get the default hooks.
    pub fn call<F>(&mut self, id: ObjectId, services: &mut Services<'_>, f: F) -> bool
    where
        F: FnOnce(&mut dyn Behavior, &mut Context<'_>),
    {
        let Some(object) = self.get_mut(id) else {
            return false;
        };
        match object.behavior.take() {
            Some(mut behavior) => {
                {
                    let mut ctx = Context::new(id, self, services);
                    f(behavior.as_mut(), &mut ctx);
                }
                // The hook may have installed a replacement; keep that one.
                if let Some(object) = self.get_mut(id) {
                    if object.behavior.is_none() {
                        object.behavior = Some(behavior);
                    }
                }
            }
            None => {
                let mut ctx = Context::new(id, self, services);
                f(&mut DefaultBehavior, &mut ctx);
            }
        }
        true
    }

    /// Run a hook on every resident object, in order.
    pub fn call_all<F>(&mut self, services: &mut Services<'_>, mut f: F)
    where
        F: FnMut(&mut dyn Behavior, &mut Context<'_>),
    {
        for id in self.ids() {
            self.call(id, services, &mut f);
        }
    }

    /// Copy body transforms into every `match_physics` object.
    pub fn sync_from_physics(&mut self, physics: &PhysicsWorld2d) -> usize {
        self.objects
            .iter_mut()
            .map(|obj| obj.sync_from_body(physics))
            .filter(|&synced| synced)
            .count()
    }
}

// ── SceneManager ────────────────────────────────────────────────────────

/// Owns the active scene and any stored, inactive ones.
#[derive(Debug, Default)]
pub struct SceneManager {
    active: Option<Scene>,
    stored: Vec<Scene>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stored scene. An existing scene of the same name,
    /// active or stored, is returned instead.
    pub fn add_scene(&mut self, name: &str) -> &mut Scene {
        if let Some(active) = self.active.as_mut().filter(|s| s.name() == name) {
            return active;
        }
        let idx = match self.stored.iter().position(|s| s.name() == name) {
            Some(idx) => idx,
            None => {
                self.stored.push(Scene::new(name));
                self.stored.len() - 1
            }
        };
        &mut self.stored[idx]
    }

    pub fn active(&self) -> Option<&Scene> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        self.active.as_mut()
    }

    /// Find a scene by name, active or stored.
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.active
            .iter()
            .chain(self.stored.iter())
            .find(|s| s.name() == name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.active
            .iter_mut()
            .chain(self.stored.iter_mut())
            .find(|s| s.name() == name)
    }

    /// Make `scene` active and call `start` on every resident object.
    /// Returns the scene that was active before, deactivated.
    pub fn load_scene(&mut self, mut scene: Scene, services: &mut Services<'_>) -> Option<Scene> {
        let mut previous = self.active.take();
        if let Some(prev) = previous.as_mut() {
            prev.set_active(services.physics, false);
        }
        scene.set_active(services.physics, true);
        log::info!("loading scene '{}' ({} objects)", scene.name(), scene.len());
        let scene = self.active.insert(scene);
        scene.call_all(services, |b, ctx| b.start(ctx));
        previous
    }

    /// Load a stored scene by name; the outgoing scene goes back to storage.
    pub fn load_stored(&mut self, name: &str, services: &mut Services<'_>) -> bool {
        let Some(idx) = self.stored.iter().position(|s| s.name() == name) else {
            log::warn!("no stored scene named '{name}'");
            return false;
        };
        let scene = self.stored.remove(idx);
        if let Some(previous) = self.load_scene(scene, services) {
            self.stored.push(previous);
        }
        true
    }

    /// Add to the active scene and call `start`.
    pub fn instantiate(&mut self, object: GameObject, services: &mut Services<'_>) -> Option<ObjectId> {
        let Some(scene) = self.active.as_mut() else {
            log::warn!("instantiate '{}' with no active scene", object.name());
            return None;
        };
        Some(scene.instantiate(object, services))
    }

    /// Remove from the active scene, retracting the body.
    pub fn destroy(&mut self, id: ObjectId, physics: &mut PhysicsWorld2d) -> Option<GameObject> {
        self.active.as_mut()?.remove(physics, id)
    }

    /// `physics_update` on every resident object (before a physics step).
    pub fn physics_update(&mut self, services: &mut Services<'_>) {
        if let Some(scene) = self.active.as_mut() {
            scene.call_all(services, |b, ctx| b.physics_update(ctx));
        }
    }

    /// `update` on every resident object, then copy body transforms into
    /// objects that track physics.
    pub fn update_scene(&mut self, delta: f32, services: &mut Services<'_>) {
        let Some(scene) = self.active.as_mut() else {
            return;
        };
        for id in scene.ids() {
            scene.call(id, services, |b, ctx| b.update(ctx, delta));
            if let Some(object) = scene.get_mut(id) {
                object.sync_from_body(services.physics);
            }
        }
    }

    pub fn render_scene(&mut self, delta: f32, services: &mut Services<'_>, canvas: &mut dyn Canvas) {
        if let Some(scene) = self.active.as_mut() {
            scene.call_all(services, |b, ctx| b.render(ctx, &mut *canvas, delta));
        }
    }

    pub fn render_gui(&mut self, delta: f32, services: &mut Services<'_>, canvas: &mut dyn Canvas) {
        if let Some(scene) = self.active.as_mut() {
            scene.call_all(services, |b, ctx| b.render_gui(ctx, &mut *canvas, delta));
        }
    }
}
