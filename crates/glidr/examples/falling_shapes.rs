//! Falling shapes — headless demo.
//!
//! A ship thrusts toward where it is facing, asteroids fall onto a static
//! ground, and a simulated tap on the ground spawns another asteroid. The last
//! frame is written as a PNG (first argument, default `falling_shapes.png`).
//!
//! Run with `RUST_LOG=debug` to see bodies being created and removed.

use std::cell::Cell;
use std::rc::Rc;

use glidr::prelude::*;
use image::{Rgba, RgbaImage};

const FRAMES: u32 = 180;
const DT: f32 = 1.0 / 60.0;

fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

fn disc(diameter: u32, color: [u8; 4]) -> RgbaImage {
    let r = diameter as f32 * 0.5;
    RgbaImage::from_fn(diameter, diameter, |x, y| {
        let d = Vec2::new(x as f32 + 0.5 - r, y as f32 + 0.5 - r).length();
        if d <= r { Rgba(color) } else { Rgba([0, 0, 0, 0]) }
    })
}

/// Turns slowly and pushes along its nose every physics step.
struct Ship {
    thrust: f32,
}

impl Behavior for Ship {
    fn physics_update(&mut self, ctx: &mut Context) {
        let dir = ctx.forward_vector(true);
        ctx.add_force(dir * self.thrust);
    }

    fn update(&mut self, ctx: &mut Context, delta: f32) {
        let rotation = ctx.object().map(|o| o.rotation).unwrap_or(0.0);
        ctx.set_rotation_deg(rotation + 45.0 * delta);

        let pos = ctx.object().map(|o| o.pos()).unwrap_or(Vec2::ZERO);
        let nose = pos + ctx.forward_vector(true) * 40.0;
        ctx.draw_line(pos.x, pos.y, nose.x, nose.y, Color::rgb(1.0, 0.8, 0.2), 2.0);

        let screen = ctx.screen_size();
        if pos.y > screen.y + 200.0 {
            ctx.destroy_me();
        }
    }
}

/// Counts physics contacts that ended.
struct Asteroid {
    bounces: Rc<Cell<u32>>,
}

impl Behavior for Asteroid {
    fn on_collision(&mut self, _ctx: &mut Context, collision: Collision) {
        if collision.source == CollisionSource::Physics {
            self.bounces.set(self.bounces.get() + 1);
        }
    }
}

/// Spawns an asteroid where it is tapped.
struct Ground {
    bounces: Rc<Cell<u32>>,
}

impl Behavior for Ground {
    fn on_touch_down(&mut self, ctx: &mut Context) {
        let Some(point) = ctx.touch_point() else {
            return;
        };
        let mut rock = GameObject::new("spawned").at(point.x, 0.0).with_behavior(Asteroid {
            bounces: self.bounces.clone(),
        });
        rock.set_sprite(ctx.sprites(), "asteroid", true);
        rock.set_rigid_body(ctx.physics_mut(), BodySpec::auto_circle());
        ctx.instantiate(rock);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    glidr::init_logging();

    let out = std::env::args().nth(1).unwrap_or_else(|| "falling_shapes.png".to_string());
    let mut engine = Engine::new(EngineConfig::default().with_debug_physics(true));

    engine.sprites_mut().insert("ground", solid(700, 40, [70, 70, 90, 255]));
    engine.sprites_mut().insert("ship", solid(24, 40, [200, 220, 255, 255]));
    engine.sprites_mut().insert("asteroid", disc(32, [150, 110, 80, 255]));

    let bounces = Rc::new(Cell::new(0));

    let mut ground = engine
        .add_game_object("ground", 50.0, 520.0, 0.0, 0.0)
        .with_behavior(Ground {
            bounces: bounces.clone(),
        });
    ground.set_sprite(engine.sprites(), "ground", true);
    ground.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect().fixed());

    let mut ship = engine
        .add_game_object("ship", 380.0, 300.0, 1.0, 0.0)
        .with_behavior(Ship { thrust: 40_000.0 });
    ship.set_sprite(engine.sprites(), "ship", true);
    ship.set_rigid_body(engine.physics_mut(), BodySpec::auto_rect());

    engine.add_scene("game");
    engine.add_silently("game", ground);
    engine.add_silently("game", ship);
    for i in 0..5 {
        let mut rock = engine
            .add_game_object(format!("asteroid{i}"), 120.0 + i as f32 * 110.0, 40.0 * i as f32, 1.0, 0.0)
            .with_behavior(Asteroid {
                bounces: bounces.clone(),
            });
        rock.set_sprite(engine.sprites(), "asteroid", true);
        rock.set_rigid_body(engine.physics_mut(), BodySpec::auto_circle());
        engine.add_silently("game", rock);
    }
    engine.load_scene("game");

    let mut canvas = ImageCanvas::new(800, 600);
    for frame in 0..FRAMES {
        // Tap the ground half-way through, holding for a few frames.
        if frame == FRAMES / 2 {
            engine.handle_touch(TouchEvent::Down(Vec2::new(400.0, 540.0)));
        }
        if frame == FRAMES / 2 + 5 {
            engine.handle_touch(TouchEvent::Up);
        }
        engine.tick(DT, &mut canvas);
    }

    let scene = engine.active_scene().map(|s| s.len()).unwrap_or(0);
    log::info!(
        "{FRAMES} frames, {scene} objects, {} bodies, {} ended contacts",
        engine.physics().body_count(),
        bounces.get()
    );

    canvas.image().save(&out)?;
    log::info!("wrote {out}");
    Ok(())
}
