//! # Engine — Frame Orchestrator
//!
//! [`Engine`] owns the scenes, the physics world, the sprite store, input and
//! the scratch line queue, and runs one frame per [`tick`](Engine::tick).
//!
//! ## Frame order
//!
//! ```text
//!   touch replay            on_touch for a held touch
//!   physics, per due step   physics_update → step → on_collision (ended pairs)
//!   update_scene            update → copy body transform (match_physics)
//!   broad-phase scan        on_collision on both sides of each overlap
//!   deferred commands       instantiate / destroy / load_scene
//!   render                  clear → render → debug wireframe → render_gui → lines
//! ```
//!
//! The host drives the loop: call [`frame`](Engine::frame) to use wall-clock
//! time, or [`tick`](Engine::tick) with an explicit delta. A panic in a hook
//! unwinds out of the tick; the host should stop scheduling.
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default());
//! let objects = LevelLoader::new().load_file("level.json", engine.sprites_mut())?;
//! engine.add_scene("game");
//! engine.populate_scene("game", &objects);
//! engine.load_scene("game");
//!
//! let mut canvas = ImageCanvas::new(800, 600);
//! while engine.is_running() {
//!     engine.frame(&mut canvas);
//! }
//! ```

use crate::collision::{dispatch_broad_phase, dispatch_physics_pairs};
use crate::config::EngineConfig;
use crate::context::{SceneCommand, Services};
use crate::input::{InputManager, TouchEvent};
use crate::level::LevelObject;
use crate::math::Vec2;
use crate::object::{GameObject, ObjectId};
use crate::physics2d::PhysicsWorld2d;
use crate::render2d::debug_wireframe::render_debug_wireframes_2d;
use crate::render2d::{Canvas, LineQueue};
use crate::scene::{Scene, SceneManager};
use crate::sprite::SpriteStore;
use crate::time::Time;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub physics_steps: u32,
    pub broad_phase_pairs: usize,
    pub commands_applied: usize,
    pub lines_drawn: usize,
}

/// The frame orchestrator.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    scenes: SceneManager,
    physics: PhysicsWorld2d,
    sprites: SpriteStore,
    input: InputManager,
    lines: LineQueue,
    commands: Vec<SceneCommand>,
    time: Time,
    screen: Vec2,
    running: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let physics = PhysicsWorld2d::new()
            .with_gravity(config.gravity())
            .with_timestep(config.fixed_timestep)
            .with_max_frame_delta(config.max_frame_delta);
        let screen = Vec2::new(config.screen_width, config.screen_height);
        Self {
            config,
            scenes: SceneManager::new(),
            physics,
            sprites: SpriteStore::new(),
            input: InputManager::new(),
            lines: LineQueue::new(),
            commands: Vec::new(),
            time: Time::new(),
            screen,
            running: true,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_debug_physics(&mut self, enabled: bool) {
        self.config.debug_physics = enabled;
    }

    pub fn physics(&self) -> &PhysicsWorld2d {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld2d {
        &mut self.physics
    }

    pub fn sprites(&self) -> &SpriteStore {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteStore {
        &mut self.sprites
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.active()
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Queue a line for the current frame.
    pub fn lines_mut(&mut self) -> &mut LineQueue {
        &mut self.lines
    }

    // ── Screen ──────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen = Vec2::new(width, height);
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen
    }

    pub fn center(&self) -> Vec2 {
        self.screen * 0.5
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    pub fn stop(&mut self) {
        log::info!("engine stopped after {} frames", self.time.frame_count());
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn split(&mut self) -> (&mut SceneManager, &mut InputManager, Services<'_>) {
        let touch = self.input.last_point();
        let services = Services {
            physics: &mut self.physics,
            sprites: &self.sprites,
            lines: &mut self.lines,
            commands: &mut self.commands,
            screen: self.screen,
            touch,
        };
        (&mut self.scenes, &mut self.input, services)
    }

    // ── Objects and scenes ──────────────────────────────────────────────

    /// Create an object. It is not resident anywhere until added to a scene.
    pub fn add_game_object(&self, name: impl Into<String>, x: f32, y: f32, z: f32, rotation: f32) -> GameObject {
        GameObject::new(name).at(x, y).with_depth(z).with_rotation(rotation)
    }

    /// Create an empty stored scene (or get the existing one).
    pub fn add_scene(&mut self, name: &str) -> &mut Scene {
        self.scenes.add_scene(name)
    }

    /// Add to a stored or active scene without calling `start`.
    pub fn add_silently(&mut self, scene: &str, object: GameObject) -> Option<ObjectId> {
        let Some(target) = self.scenes.scene_mut(scene) else {
            log::warn!("add_silently: no scene named '{scene}'");
            return None;
        };
        Some(target.add_silently(&mut self.physics, object))
    }

    /// Make a stored scene active, calling `start` on its objects.
    pub fn load_scene(&mut self, name: &str) -> bool {
        let (scenes, _, mut services) = self.split();
        scenes.load_stored(name, &mut services)
    }

    /// Make `scene` active and hand back the previously active one.
    pub fn set_scene(&mut self, scene: Scene) -> Option<Scene> {
        let (scenes, _, mut services) = self.split();
        scenes.load_scene(scene, &mut services)
    }

    /// Add to the active scene and call `start`.
    pub fn instantiate(&mut self, object: GameObject) -> Option<ObjectId> {
        let (scenes, _, mut services) = self.split();
        scenes.instantiate(object, &mut services)
    }

    /// Remove from the active scene and retract the body.
    pub fn destroy(&mut self, id: ObjectId) -> Option<GameObject> {
        self.scenes.destroy(id, &mut self.physics)
    }

    /// Fill a scene from level records: sprite (resized to the image), then
    /// shift by half the size since level positions are centres. Objects are
    /// added silently. Returns how many were added.
    pub fn populate_scene(&mut self, scene: &str, objects: &[LevelObject]) -> usize {
        let Some(target) = self.scenes.scene_mut(scene) else {
            log::warn!("populate_scene: no scene named '{scene}'");
            return 0;
        };
        for (index, record) in objects.iter().enumerate() {
            let mut object = GameObject::new(format!("{}{index}", record.image_name))
                .at(record.x, record.y)
                .with_depth(1.0)
                .with_rotation(record.rotation)
                .with_scale(record.scale_x, record.scale_y);
            object.set_sprite(&self.sprites, &record.image_name, true);
            object.x += object.width / 2.0;
            object.y += object.height / 2.0;
            target.add_silently(&mut self.physics, object);
        }
        log::debug!("populated scene '{scene}' with {} objects", objects.len());
        objects.len()
    }

    // ── Input ───────────────────────────────────────────────────────────

    /// Feed a touch event; `Down`/`Up` dispatch immediately.
    pub fn handle_touch(&mut self, event: TouchEvent) -> usize {
        let (scenes, input, mut services) = self.split();
        input.handle(event, scenes.active_mut(), &mut services)
    }

    /// Translate and feed a winit window event.
    #[cfg(feature = "winit")]
    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) -> usize {
        if let winit::event::WindowEvent::Resized(size) = event {
            self.resize(size.width as f32, size.height as f32);
            return 0;
        }
        match self.input.translate_window_event(event) {
            Some(touch) => self.handle_touch(touch),
            None => 0,
        }
    }

    // ── Frame ───────────────────────────────────────────────────────────

    /// Run one frame using the wall-clock time since the previous frame.
    pub fn frame(&mut self, canvas: &mut dyn Canvas) -> FrameStats {
        self.time.update();
        let delta = self.time.delta_secs();
        self.run_frame(delta, canvas)
    }

    /// Run one frame of `delta` seconds.
    pub fn tick(&mut self, delta: f32, canvas: &mut dyn Canvas) -> FrameStats {
        self.time.advance(delta);
        self.run_frame(delta, canvas)
    }

    fn run_frame(&mut self, delta: f32, canvas: &mut dyn Canvas) -> FrameStats {
        let mut stats = FrameStats::default();
        if !self.running {
            return stats;
        }
        let clear_color = self.config.clear_color;
        let debug = self.config.debug_physics.then_some(self.config.debug_color);
        let (scenes, input, mut services) = self.split();

        input.replay(scenes.active_mut(), &mut services);

        stats.physics_steps = services.physics.advance(delta);
        for _ in 0..stats.physics_steps {
            scenes.physics_update(&mut services);
            let ended = services.physics.step_once();
            if let Some(scene) = scenes.active_mut() {
                dispatch_physics_pairs(scene, &mut services, &ended);
            }
        }

        scenes.update_scene(delta, &mut services);

        if let Some(scene) = scenes.active_mut() {
            stats.broad_phase_pairs = dispatch_broad_phase(scene, &mut services);
        }

        stats.commands_applied = apply_commands(scenes, &mut services);

        canvas.clear(clear_color);
        scenes.render_scene(delta, &mut services, canvas);
        if let Some(color) = debug {
            render_debug_wireframes_2d(services.physics, canvas, color);
        }
        scenes.render_gui(delta, &mut services, canvas);
        stats.lines_drawn = services.lines.flush(canvas);

        log::trace!("frame: {stats:?}");
        stats
    }
}

/// Apply queued structure changes, including any queued while applying.
fn apply_commands(scenes: &mut SceneManager, services: &mut Services<'_>) -> usize {
    let mut applied = 0;
    while !services.commands.is_empty() {
        let pending = std::mem::take(services.commands);
        for command in pending {
            match command {
                SceneCommand::Instantiate(object) => {
                    scenes.instantiate(object, services);
                }
                SceneCommand::Destroy(id) => {
                    scenes.destroy(id, services.physics);
                }
                SceneCommand::LoadScene(name) => {
                    scenes.load_stored(&name, services);
                }
            }
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::context::Context;
    use crate::object::{Behavior, BodySpec, Collision, CollisionSource};
    use crate::render2d::{Color, DrawCommand, DrawList};

    const DT: f32 = 1.0 / 60.0;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default())
    }

    #[test]
    fn line_is_drawn_only_in_the_frame_it_was_queued() {
        struct DrawOnce(bool);
        impl Behavior for DrawOnce {
            fn update(&mut self, ctx: &mut Context, _delta: f32) {
                if !self.0 {
                    self.0 = true;
                    ctx.draw_line(0.0, 0.0, 10.0, 10.0, Color::RED, 2.0);
                }
            }
        }

        let mut engine = engine();
        engine.add_scene("s");
        engine.add_silently("s", GameObject::new("pen").with_behavior(DrawOnce(false)));
        assert!(engine.load_scene("s"));

        let mut canvas = DrawList::new();
        assert_eq!(engine.tick(DT, &mut canvas).lines_drawn, 1);
        assert_eq!(canvas.lines().count(), 1);
        assert_eq!(engine.tick(DT, &mut canvas).lines_drawn, 0);
        assert_eq!(canvas.lines().count(), 0);
    }

    #[test]
    fn render_order_is_entities_then_debug_then_gui_then_lines() {
        struct Gui;
        impl Behavior for Gui {
            fn update(&mut self, ctx: &mut Context, _delta: f32) {
                ctx.draw_line(1.0, 1.0, 2.0, 2.0, Color::BLUE, 1.0);
            }
            fn render_gui(&mut self, _ctx: &mut Context, canvas: &mut dyn Canvas, _delta: f32) {
                canvas.clear(Color::RED);
            }
        }

        let mut engine = Engine::new(EngineConfig::default().with_debug_physics(true));
        engine.sprites_mut().insert("dot", RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])));
        engine.add_scene("s");
        let mut boxed = GameObject::new("boxed").with_size(10.0, 10.0);
        boxed.set_sprite(engine.sprites(), "dot", false);
        boxed.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect().fixed());
        engine.add_silently("s", boxed);
        engine.add_silently("s", GameObject::new("gui").with_behavior(Gui));
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        engine.tick(DT, &mut canvas);
        // The GUI pass cleared the list, so only the queued line follows it.
        assert_eq!(canvas.commands()[0], DrawCommand::Clear(Color::RED));
        assert_eq!(canvas.lines().count(), 1);

        let gui = engine.active_scene().and_then(|s| s.find("gui")).unwrap();
        assert!(engine.destroy(gui).is_some());
        let mut plain = DrawList::new();
        engine.tick(DT, &mut plain);
        let kinds: Vec<&str> = plain
            .commands()
            .iter()
            .map(|c| match c {
                DrawCommand::Clear(_) => "clear",
                DrawCommand::Sprite { .. } => "sprite",
                DrawCommand::Line(_) => "line",
            })
            .collect();
        assert_eq!(kinds, ["clear", "sprite", "line", "line", "line", "line"]);
    }

    #[test]
    fn physics_update_runs_once_per_step_before_integration() {
        struct Thrust(Rc<Cell<u32>>);
        impl Behavior for Thrust {
            fn physics_update(&mut self, ctx: &mut Context) {
                self.0.set(self.0.get() + 1);
                ctx.add_force(Vec2::new(0.0, -1.0e6));
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut engine = Engine::new(EngineConfig::default().with_gravity(Vec2::ZERO));
        engine.add_scene("s");
        let mut rocket = GameObject::new("rocket").with_size(10.0, 10.0).with_behavior(Thrust(calls.clone()));
        rocket.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect());
        let id = engine.add_silently("s", rocket).unwrap();
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        let stats = engine.tick(DT * 3.5, &mut canvas);
        assert_eq!(stats.physics_steps, 3);
        assert_eq!(calls.get(), 3);
        let rocket = engine.active_scene().unwrap().get(id).unwrap();
        assert!(rocket.y < 5.0, "thrust should lift the rocket, y = {}", rocket.y);
    }

    #[test]
    fn broad_phase_notifies_both_sides_each_frame() {
        struct Hit(Rc<RefCell<Vec<Collision>>>);
        impl Behavior for Hit {
            fn on_collision(&mut self, _ctx: &mut Context, collision: Collision) {
                self.0.borrow_mut().push(collision);
            }
        }

        let hits = Rc::new(RefCell::new(Vec::new()));
        let mut engine = engine();
        engine.add_scene("s");
        engine.add_silently("s", GameObject::new("a").with_behavior(Hit(hits.clone())));
        engine.add_silently("s", GameObject::new("b").at(50.0, 50.0).with_behavior(Hit(hits.clone())));
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        assert_eq!(engine.tick(DT, &mut canvas).broad_phase_pairs, 1);
        assert_eq!(engine.tick(DT, &mut canvas).broad_phase_pairs, 1);
        let hits = hits.borrow();
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|c| c.source == CollisionSource::BroadPhase));
    }

    #[test]
    fn destroy_from_hook_is_deferred_to_end_of_frame() {
        struct SelfDestruct(Rc<Cell<u32>>);
        impl Behavior for SelfDestruct {
            fn update(&mut self, ctx: &mut Context, _delta: f32) {
                self.0.set(self.0.get() + 1);
                ctx.destroy_me();
            }
            fn on_collision(&mut self, _ctx: &mut Context, _collision: Collision) {
                // Still resident during the collision pass of the same frame.
                self.0.set(self.0.get() + 10);
            }
        }

        let count = Rc::new(Cell::new(0));
        let mut engine = engine();
        engine.add_scene("s");
        let mut doomed = GameObject::new("doomed").with_behavior(SelfDestruct(count.clone()));
        let body = doomed.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect());
        engine.add_silently("s", doomed);
        engine.add_silently("s", GameObject::new("bystander"));
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        let stats = engine.tick(DT, &mut canvas);
        assert_eq!(stats.commands_applied, 1);
        assert_eq!(count.get(), 11);
        assert_eq!(engine.active_scene().unwrap().len(), 1);
        assert!(!engine.physics().contains(body));

        engine.tick(DT, &mut canvas);
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn hooks_can_spawn_and_switch_scenes() {
        struct Spawner;
        impl Behavior for Spawner {
            fn start(&mut self, ctx: &mut Context) {
                ctx.instantiate(GameObject::new("child"));
            }
            fn update(&mut self, ctx: &mut Context, _delta: f32) {
                if ctx.find("child").is_some() {
                    ctx.load_scene("next");
                }
            }
        }

        let mut engine = engine();
        engine.add_scene("first");
        engine.add_scene("next");
        engine.add_silently("first", GameObject::new("spawner").with_behavior(Spawner));
        engine.load_scene("first");
        // `start` ran inside load_scene; the spawn waits for the frame.
        assert_eq!(engine.active_scene().unwrap().len(), 1);

        let mut canvas = DrawList::new();
        engine.tick(DT, &mut canvas);
        assert_eq!(engine.active_scene().unwrap().len(), 2);
        engine.tick(DT, &mut canvas);
        assert_eq!(engine.active_scene().unwrap().name(), "next");
        assert!(engine.scenes().scene("first").is_some());
    }

    #[test]
    fn touch_replays_each_frame_while_held() {
        struct Held(Rc<Cell<u32>>);
        impl Behavior for Held {
            fn on_touch(&mut self, _ctx: &mut Context) {
                self.0.set(self.0.get() + 1);
            }
        }

        let held = Rc::new(Cell::new(0));
        let mut engine = engine();
        engine.add_scene("s");
        engine.add_silently("s", GameObject::new("button").at(50.0, 50.0).with_behavior(Held(held.clone())));
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        assert_eq!(engine.handle_touch(TouchEvent::Down(Vec2::new(60.0, 60.0))), 1);
        engine.tick(DT, &mut canvas);
        engine.tick(DT, &mut canvas);
        engine.handle_touch(TouchEvent::Up);
        engine.tick(DT, &mut canvas);
        assert_eq!(held.get(), 2);
    }

    #[test]
    fn populate_scene_centres_level_records() {
        let mut engine = engine();
        engine.sprites_mut().insert("rock", RgbaImage::new(40, 20));
        engine.add_scene("level");
        let records = [LevelObject {
            x: 100.0,
            y: 50.0,
            rotation: 30.0,
            scale_x: 1.0,
            scale_y: 2.0,
            name: "boulder".into(),
            image_name: "rock".into(),
            image_b64: None,
        }];
        assert_eq!(engine.populate_scene("level", &records), 1);
        assert_eq!(engine.populate_scene("missing", &records), 0);

        let scene = engine.scenes().scene("level").unwrap();
        let rock = scene.get(scene.find("rock0").unwrap()).unwrap();
        assert_eq!((rock.x, rock.y), (120.0, 60.0));
        assert_eq!(rock.size(), Vec2::new(40.0, 20.0));
        assert_eq!(rock.rotation, 30.0);
        assert_eq!(rock.scale(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn stopped_engine_does_nothing() {
        let mut engine = engine();
        engine.resize(1024.0, 768.0);
        assert_eq!(engine.center(), Vec2::new(512.0, 384.0));
        engine.stop();
        assert!(!engine.is_running());
        let mut canvas = DrawList::new();
        assert_eq!(engine.tick(DT, &mut canvas), FrameStats::default());
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn separating_bodies_notify_both_sides() {
        struct Push {
            dir: f32,
            log: Rc<RefCell<Vec<(ObjectId, Collision)>>>,
        }
        impl Behavior for Push {
            fn physics_update(&mut self, ctx: &mut Context) {
                ctx.add_force(Vec2::new(self.dir * 2.0e7, 0.0));
            }
            fn on_collision(&mut self, ctx: &mut Context, collision: Collision) {
                if collision.source == CollisionSource::Physics {
                    self.log.borrow_mut().push((ctx.me(), collision));
                }
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut engine = Engine::new(EngineConfig::default().with_gravity(Vec2::ZERO));
        engine.add_scene("s");
        for (name, x, dir) in [("left", 0.0, -1.0), ("right", 15.0, 1.0)] {
            let mut obj = GameObject::new(name).at(x, 0.0).with_size(20.0, 20.0).with_behavior(Push {
                dir,
                log: log.clone(),
            });
            obj.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect());
            engine.add_silently("s", obj);
        }
        engine.load_scene("s");
        let scene = engine.active_scene().unwrap();
        let (left, right) = (scene.find("left").unwrap(), scene.find("right").unwrap());

        let mut canvas = DrawList::new();
        for _ in 0..60 {
            engine.tick(DT, &mut canvas);
            if !log.borrow().is_empty() {
                break;
            }
        }

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(log.contains(&(left, Collision { other: Some(right), source: CollisionSource::Physics })));
        assert!(log.contains(&(right, Collision { other: Some(left), source: CollisionSource::Physics })));
    }

    #[test]
    fn non_finite_delta_does_not_panic() {
        let mut engine = engine();
        engine.add_scene("s");
        let mut obj = GameObject::new("crate").with_size(10.0, 10.0);
        obj.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect());
        engine.add_silently("s", obj);
        engine.load_scene("s");

        let mut canvas = DrawList::new();
        let stats = engine.tick(f32::INFINITY, &mut canvas);
        assert!(stats.physics_steps > 0);
        engine.tick(f32::NAN, &mut canvas);
        assert_eq!(engine.time().delta_secs(), 0.0);
    }
}
