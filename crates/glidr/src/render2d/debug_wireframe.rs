//! Debug wireframe rendering for physics bodies.
//!
//! Draws every enabled body's outline as line segments on top of the entity
//! pass: boxes as their four rotated edges, circles as a polygon plus a
//! radius spoke so rotation stays visible.

use super::{Canvas, Color, Line};
use crate::math::Vec2;
use crate::physics2d::{BodyShape, BodyState, PhysicsWorld2d};

const CIRCLE_SEGMENTS: u32 = 24;

fn box_outline(width: f32, height: f32) -> Vec<(Vec2, Vec2)> {
    let (hx, hy) = (width * 0.5, height * 0.5);
    let corners = [
        Vec2::new(-hx, -hy),
        Vec2::new(hx, -hy),
        Vec2::new(hx, hy),
        Vec2::new(-hx, hy),
    ];
    (0..4).map(|i| (corners[i], corners[(i + 1) % 4])).collect()
}

fn circle_outline(radius: f32, segments: u32) -> Vec<(Vec2, Vec2)> {
    let seg = segments.max(3);
    let step = std::f32::consts::TAU / seg as f32;
    let mut edges: Vec<(Vec2, Vec2)> = (0..seg)
        .map(|i| {
            let a = i as f32 * step;
            let b = (i + 1) as f32 * step;
            (
                Vec2::new(a.cos(), a.sin()) * radius,
                Vec2::new(b.cos(), b.sin()) * radius,
            )
        })
        .collect();
    edges.push((Vec2::ZERO, Vec2::new(radius, 0.0)));
    edges
}

/// World-space outline segments of one body.
pub(crate) fn body_outline(state: &BodyState) -> Vec<(Vec2, Vec2)> {
    let local = match state.shape {
        BodyShape::Box { width, height } => box_outline(width, height),
        BodyShape::Circle { radius } => circle_outline(radius, CIRCLE_SEGMENTS),
    };
    let rot = Vec2::from_angle(state.angle);
    local
        .into_iter()
        .map(|(a, b)| (state.position + rot.rotate(a), state.position + rot.rotate(b)))
        .collect()
}

/// Outline every enabled body onto `canvas`.
pub(crate) fn render_debug_wireframes_2d(physics: &PhysicsWorld2d, canvas: &mut dyn Canvas, color: Color) {
    for state in physics.bodies().filter(|s| s.enabled) {
        for (from, to) in body_outline(&state) {
            canvas.draw_line(&Line {
                from,
                to,
                color,
                width: 1.0,
            });
        }
    }
}
