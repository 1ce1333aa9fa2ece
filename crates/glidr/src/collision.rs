//! Collision dispatch.
//!
//! Two independent signals reach [`Behavior::on_collision`](crate::object::Behavior::on_collision):
//!
//! - **Broad-phase**: every frame, every unordered pair of resident objects
//!   whose logical boxes (top-left anchored, from `size()`) overlap. Works for
//!   objects without bodies.
//! - **Physics**: body pairs the physics world reports as no longer touching,
//!   resolved to objects through the scene's body table.
//!
//! The two are not deduplicated; one physical overlap may produce both.

use crate::context::Services;
use crate::math::Aabb;
use crate::object::{Collision, CollisionSource, ObjectId};
use crate::physics2d::BodyPair;
use crate::scene::Scene;

/// Unordered overlapping pairs, each reported once with `a` before `b` in
/// scene order. Objects never pair with themselves.
pub fn overlapping_pairs(scene: &Scene) -> Vec<(ObjectId, ObjectId)> {
    let boxes: Vec<(ObjectId, Aabb)> = scene
        .iter()
        .map(|obj| (obj.id(), Aabb::from_corner(obj.pos(), obj.size())))
        .collect();

    let mut pairs = Vec::new();
    for (i, (a, box_a)) in boxes.iter().enumerate() {
        for (b, box_b) in &boxes[i + 1..] {
            if box_a.overlaps(box_b) {
                pairs.push((*a, *b));
            }
        }
    }
    pairs
}

/// Run the broad-phase scan and notify both sides of every overlap.
/// Returns the number of pairs found.
pub fn dispatch_broad_phase(scene: &mut Scene, services: &mut Services<'_>) -> usize {
    let pairs = overlapping_pairs(scene);
    for &(a, b) in &pairs {
        notify(scene, services, a, Some(b), CollisionSource::BroadPhase);
        notify(scene, services, b, Some(a), CollisionSource::BroadPhase);
    }
    if !pairs.is_empty() {
        log::trace!("broad-phase: {} overlapping pairs", pairs.len());
    }
    pairs.len()
}

/// Resolve ended physics pairs to objects and notify each resolved side.
pub fn dispatch_physics_pairs(scene: &mut Scene, services: &mut Services<'_>, pairs: &[BodyPair]) {
    for &BodyPair(body_a, body_b) in pairs {
        let a = scene.object_for_body(body_a);
        let b = scene.object_for_body(body_b);
        if let Some(a) = a {
            notify(scene, services, a, b, CollisionSource::Physics);
        }
        if let Some(b) = b {
            notify(scene, services, b, a, CollisionSource::Physics);
        }
    }
    if !pairs.is_empty() {
        log::trace!("physics: {} ended contact pairs", pairs.len());
    }
}

fn notify(
    scene: &mut Scene,
    services: &mut Services<'_>,
    target: ObjectId,
    other: Option<ObjectId>,
    source: CollisionSource,
) {
    let collision = Collision { other, source };
    scene.call(target, services, |b, ctx| b.on_collision(ctx, collision));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::context::{Context, SceneCommand};
    use crate::math::Vec2;
    use crate::object::{Behavior, BodySpec, GameObject};
    use crate::physics2d::PhysicsWorld2d;
    use crate::render2d::LineQueue;
    use crate::sprite::SpriteStore;

    type Hits = Rc<RefCell<Vec<(ObjectId, Collision)>>>;

    struct Recorder(Hits);

    impl Behavior for Recorder {
        fn on_collision(&mut self, ctx: &mut Context, collision: Collision) {
            self.0.borrow_mut().push((ctx.me(), collision));
        }
    }

    fn boxed(name: &str, x: f32, y: f32, hits: &Hits) -> GameObject {
        GameObject::new(name)
            .at(x, y)
            .with_size(10.0, 10.0)
            .with_behavior(Recorder(hits.clone()))
    }

    fn run(scene: &mut Scene, physics: &mut PhysicsWorld2d, pairs: Option<&[BodyPair]>) -> usize {
        let sprites = SpriteStore::new();
        let mut lines = LineQueue::new();
        let mut commands: Vec<SceneCommand> = Vec::new();
        let mut services = Services {
            physics,
            sprites: &sprites,
            lines: &mut lines,
            commands: &mut commands,
            screen: Vec2::new(100.0, 100.0),
            touch: None,
        };
        match pairs {
            Some(pairs) => {
                dispatch_physics_pairs(scene, &mut services, pairs);
                0
            }
            None => dispatch_broad_phase(scene, &mut services),
        }
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let hits = Hits::default();
        let mut physics = PhysicsWorld2d::new();
        let mut scene = Scene::new("s");
        scene.add_silently(&mut physics, boxed("a", 0.0, 0.0, &hits));
        scene.add_silently(&mut physics, boxed("b", 10.0, 0.0, &hits));
        assert!(overlapping_pairs(&scene).is_empty());
    }

    #[test]
    fn broad_phase_is_symmetric_and_skips_self() {
        for order in [[0, 1], [1, 0]] {
            let hits = Hits::default();
            let mut physics = PhysicsWorld2d::new();
            let objects = [boxed("a", 0.0, 0.0, &hits), boxed("b", 5.0, 5.0, &hits)];
            let ids: Vec<ObjectId> = objects.iter().map(|o| o.id()).collect();
            let mut scene = Scene::new("s");
            let [first, second] = objects;
            let (x, y) = if order[0] == 0 { (first, second) } else { (second, first) };
            scene.add_silently(&mut physics, x);
            scene.add_silently(&mut physics, y);
            scene.add_silently(&mut physics, boxed("far", 500.0, 500.0, &hits));

            assert_eq!(run(&mut scene, &mut physics, None), 1);
            let hits = hits.borrow();
            assert_eq!(hits.len(), 2);
            let (a, b) = (ids[0], ids[1]);
            let expected = |me: ObjectId, other: ObjectId| {
                hits.iter().filter(|(target, c)| *target == me && c.other == Some(other)).count()
            };
            assert_eq!(expected(a, b), 1);
            assert_eq!(expected(b, a), 1);
            assert!(hits.iter().all(|(_, c)| c.source == CollisionSource::BroadPhase));
        }
    }

    #[test]
    fn physics_pairs_resolve_through_body_table() {
        let hits = Hits::default();
        let mut physics = PhysicsWorld2d::new();
        let mut scene = Scene::new("s");
        let mut a = boxed("a", 0.0, 0.0, &hits);
        let body_a = a.set_rigid_body(&mut physics, BodySpec::auto_rect());
        let a = scene.add_silently(&mut physics, a);

        let mut orphan = GameObject::new("orphan");
        let body_orphan = orphan.set_rigid_body(&mut physics, BodySpec::auto_rect());

        run(&mut scene, &mut physics, Some(&[BodyPair(body_a, body_orphan)]));

        let hits = hits.borrow();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, a);
        assert_eq!(
            hits[0].1,
            Collision {
                other: None,
                source: CollisionSource::Physics
            }
        );
    }
}
