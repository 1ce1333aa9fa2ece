//! Touch and pointer input.
//!
//! [`InputManager`] runs a small state machine over [`TouchEvent`]s:
//!
//! ```text
//!   idle ──Down──► touching ──Move*──► touching ──Up──► idle
//! ```
//!
//! `Down` and `Up` hit-test the active scene immediately and fire
//! `on_touch_down` / `on_touch_up`. `Move` only records the latest point;
//! `on_touch` is fired once per frame by [`InputManager::replay`], so a held
//! but stationary touch keeps firing.
//!
//! Hit-testing uses each object's logical box centred on its position.
//! Every containing object is notified, in scene order.

use crate::context::Services;
use crate::math::{Aabb, Vec2};
use crate::object::ObjectId;
use crate::scene::Scene;

/// A host-agnostic touch or pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

#[derive(Debug, Clone, Copy)]
enum TouchHook {
    Down,
    Held,
    Up,
}

/// Objects whose centred logical box strictly contains `point`.
pub fn hit_test(scene: &Scene, point: Vec2) -> Vec<ObjectId> {
    scene
        .iter()
        .filter(|obj| Aabb::from_center(obj.pos(), obj.size()).contains(point))
        .map(|obj| obj.id())
        .collect()
}

/// Tracks the current touch and dispatches touch hooks.
#[derive(Debug, Default)]
pub struct InputManager {
    last: Option<Vec2>,
    touching: bool,
    #[cfg(feature = "winit")]
    cursor: Vec2,
    #[cfg(feature = "winit")]
    finger: Option<u64>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Latest touch point, cleared on release.
    pub fn last_point(&self) -> Option<Vec2> {
        self.last
    }

    /// Feed one event. `Down`/`Up` dispatch immediately against `scene`.
    /// Returns how many objects were notified.
    pub fn handle(&mut self, event: TouchEvent, scene: Option<&mut Scene>, services: &mut Services<'_>) -> usize {
        match event {
            TouchEvent::Down(point) => {
                self.last = Some(point);
                self.touching = true;
                dispatch(scene, services, point, TouchHook::Down)
            }
            TouchEvent::Move(point) => {
                if self.touching {
                    self.last = Some(point);
                }
                0
            }
            TouchEvent::Up => {
                let Some(point) = self.last else {
                    return 0;
                };
                let notified = dispatch(scene, services, point, TouchHook::Up);
                self.last = None;
                self.touching = false;
                notified
            }
        }
    }

    /// Fire `on_touch` for the held touch, if any.
    pub fn replay(&self, scene: Option<&mut Scene>, services: &mut Services<'_>) -> usize {
        match (self.touching, self.last) {
            (true, Some(point)) => dispatch(scene, services, point, TouchHook::Held),
            _ => 0,
        }
    }

    /// Map a winit window event onto a [`TouchEvent`]. Touches follow the
    /// first finger down; the left mouse button acts as a single touch.
    #[cfg(feature = "winit")]
    pub fn translate_window_event(&mut self, event: &winit::event::WindowEvent) -> Option<TouchEvent> {
        use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

        match event {
            WindowEvent::Touch(touch) => {
                let point = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started if self.finger.is_none() => {
                        self.finger = Some(touch.id);
                        Some(TouchEvent::Down(point))
                    }
                    TouchPhase::Moved if self.finger == Some(touch.id) => Some(TouchEvent::Move(point)),
                    TouchPhase::Ended | TouchPhase::Cancelled if self.finger == Some(touch.id) => {
                        self.finger = None;
                        Some(TouchEvent::Up)
                    }
                    _ => None,
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.touching.then_some(TouchEvent::Move(self.cursor))
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => Some(TouchEvent::Down(self.cursor)),
                ElementState::Released => Some(TouchEvent::Up),
            },
            _ => None,
        }
    }
}

fn dispatch(scene: Option<&mut Scene>, services: &mut Services<'_>, point: Vec2, hook: TouchHook) -> usize {
    let Some(scene) = scene else {
        return 0;
    };
    services.touch = Some(point);
    let hits = hit_test(scene, point);
    for &id in &hits {
        scene.call(id, services, |b, ctx| match hook {
            TouchHook::Down => b.on_touch_down(ctx),
            TouchHook::Held => b.on_touch(ctx),
            TouchHook::Up => b.on_touch_up(ctx),
        });
    }
    hits.len()
}
