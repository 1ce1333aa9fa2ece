//! 2D physics integration via Rapier.
//!
//! [`PhysicsWorld2d`] wraps a Rapier simulation and exposes only what the
//! scene layer consumes: box and circle bodies, a fixed-timestep runner,
//! force/torque application, transform and velocity readers, and the list of
//! body pairs that stopped touching during a step.
//!
//! Rapier does not remember the authored size of a body, so every body gets a
//! small [`BodyShape`] record kept in a table next to the Rapier sets. Debug
//! drawing and hit-testing read dimensions from that record.
//!
//! Coordinates are screen space (y down) and angles are radians; positive
//! angles rotate clockwise on screen.

use std::collections::{HashMap, HashSet};

use rapier2d::prelude::*;

use crate::math::Vec2 as Point;

// ── Conversion helpers ──────────────────────────────────────────────────

fn to_rapier(v: Point) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn shape_to_collider_builder(shape: &BodyShape) -> ColliderBuilder {
    match *shape {
        BodyShape::Box { width, height } => ColliderBuilder::cuboid(width * 0.5, height * 0.5),
        BodyShape::Circle { radius } => ColliderBuilder::ball(radius),
    }
}

// ── Handles and records ─────────────────────────────────────────────────

/// Opaque reference to a body inside a [`PhysicsWorld2d`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// Authored shape and size of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Box { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl BodyShape {
    /// Width and height of the shape's bounding box (diameter for circles).
    pub fn extents(&self) -> Point {
        match *self {
            BodyShape::Box { width, height } => Point::new(width, height),
            BodyShape::Circle { radius } => Point::splat(radius * 2.0),
        }
    }
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub is_static: bool,
    /// Centroid in world space.
    pub position: Point,
    /// Initial angle in radians.
    pub angle: f32,
}

#[derive(Debug, Clone, Copy)]
struct BodyRecord {
    shape: BodyShape,
    is_static: bool,
    collider: ColliderHandle,
}

/// Read-only snapshot of a live body.
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    pub handle: BodyHandle,
    pub shape: BodyShape,
    pub is_static: bool,
    pub enabled: bool,
    pub position: Point,
    pub angle: f32,
}

/// Two bodies whose contact ended during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPair(pub BodyHandle, pub BodyHandle);

// ── Resource ────────────────────────────────────────────────────────────

/// The 2D physics world.
pub struct PhysicsWorld2d {
    gravity: Vec2,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    records: HashMap<RigidBodyHandle, BodyRecord>,
    touching: HashSet<(ColliderHandle, ColliderHandle)>,
    accumulator: f32,
    max_frame_delta: f32,
}

impl std::fmt::Debug for PhysicsWorld2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld2d")
            .field("gravity", &(self.gravity.x, self.gravity.y))
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl PhysicsWorld2d {
    /// Create a world with downward screen-space gravity of 1000 units/s².
    pub fn new() -> Self {
        Self {
            gravity: Vec2::new(0.0, 1000.0),
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            records: HashMap::new(),
            touching: HashSet::new(),
            accumulator: 0.0,
            max_frame_delta: 0.25,
        }
    }

    /// Set gravity (builder pattern).
    pub fn with_gravity(mut self, g: Point) -> Self {
        self.gravity = to_rapier(g);
        self
    }

    /// Set the fixed step length in seconds.
    pub fn with_timestep(mut self, dt: f32) -> Self {
        if dt > 0.0 {
            self.params.dt = dt;
        }
        self
    }

    /// Cap applied to each frame delta before it enters the accumulator.
    pub fn with_max_frame_delta(mut self, max: f32) -> Self {
        self.max_frame_delta = max;
        self
    }

    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    // ── Bodies ──────────────────────────────────────────────────────────

    /// Create a body. It starts disabled and does not simulate until
    /// [`set_enabled`](Self::set_enabled) turns it on.
    pub fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let builder = if desc.is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let rb = builder
            .translation(to_rapier(desc.position))
            .rotation(desc.angle)
            .enabled(false)
            .build();
        let handle = self.bodies.insert(rb);
        let coll = shape_to_collider_builder(&desc.shape).friction(0.1).build();
        let collider = self
            .colliders
            .insert_with_parent(coll, handle, &mut self.bodies);
        self.records.insert(
            handle,
            BodyRecord {
                shape: desc.shape,
                is_static: desc.is_static,
                collider,
            },
        );
        log::debug!("created {:?} body at ({}, {})", desc.shape, desc.position.x, desc.position.y);
        BodyHandle(handle)
    }

    /// Remove a body and its collider from the simulation. Returns `false`
    /// if the handle was already gone.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(record) = self.records.remove(&handle.0) else {
            return false;
        };
        self.touching
            .retain(|(a, b)| *a != record.collider && *b != record.collider);
        self.bodies.remove(
            handle.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        log::debug!("removed {:?} body", record.shape);
        true
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.records.contains_key(&handle.0)
    }

    pub fn set_enabled(&mut self, handle: BodyHandle, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.set_enabled(enabled);
        }
    }

    pub fn is_enabled(&self, handle: BodyHandle) -> bool {
        self.bodies
            .get(handle.0)
            .map(|body| body.is_enabled())
            .unwrap_or(false)
    }

    /// Authored shape of a body.
    pub fn shape(&self, handle: BodyHandle) -> Option<BodyShape> {
        self.records.get(&handle.0).map(|r| r.shape)
    }

    /// Centroid position in world space.
    pub fn position(&self, handle: BodyHandle) -> Option<Point> {
        let body = self.bodies.get(handle.0)?;
        let t = body.translation();
        Some(Point::new(t.x, t.y))
    }

    /// Angle in radians.
    pub fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(handle.0).map(|body| body.rotation().angle())
    }

    /// Teleport the body to a new angle, keeping its centroid.
    pub fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            let t = body.translation();
            let translation = Vec2::new(t.x, t.y);
            body.set_position(Pose::new(translation, angle), true);
        }
    }

    /// Linear velocity, zero for unknown handles.
    pub fn velocity(&self, handle: BodyHandle) -> Point {
        self.bodies
            .get(handle.0)
            .map(|body| {
                let v = body.linvel();
                Point::new(v.x, v.y)
            })
            .unwrap_or(Point::ZERO)
    }

    /// Apply a force at the body's centroid until the next step.
    pub fn add_force(&mut self, handle: BodyHandle, force: Point) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.add_force(to_rapier(force), true);
        }
    }

    /// Apply a torque until the next step.
    pub fn add_torque(&mut self, handle: BodyHandle, torque: f32) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.add_torque(torque, true);
        }
    }

    /// Snapshot of every live body.
    pub fn bodies(&self) -> impl Iterator<Item = BodyState> + '_ {
        self.records.iter().filter_map(|(handle, record)| {
            let body = self.bodies.get(*handle)?;
            let t = body.translation();
            Some(BodyState {
                handle: BodyHandle(*handle),
                shape: record.shape,
                is_static: record.is_static,
                enabled: body.is_enabled(),
                position: Point::new(t.x, t.y),
                angle: body.rotation().angle(),
            })
        })
    }

    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    // ── Stepping ────────────────────────────────────────────────────────

    /// Feed a frame delta into the accumulator and return how many fixed
    /// steps are now due. The caller runs [`step_once`](Self::step_once)
    /// that many times.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt <= 0.0 {
            return 0;
        }
        // Cap the delta to prevent a spiral of death after a long stall.
        self.accumulator += frame_dt.min(self.max_frame_delta);

        let fixed_dt = self.params.dt;
        let mut steps = 0;
        while self.accumulator >= fixed_dt {
            self.accumulator -= fixed_dt;
            steps += 1;
        }
        steps
    }

    /// Run one fixed step and report the body pairs that stopped touching.
    pub fn step_once(&mut self) -> Vec<BodyPair> {
        self.pipeline.step(
            self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        // Forces are per-step impulses, not persistent thrusters.
        for (_handle, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }

        let now: HashSet<(ColliderHandle, ColliderHandle)> = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact())
            .map(|pair| (pair.collider1, pair.collider2))
            .collect();

        let ended: Vec<BodyPair> = self
            .touching
            .difference(&now)
            .filter_map(|(a, b)| {
                let body_a = self.colliders.get(*a)?.parent()?;
                let body_b = self.colliders.get(*b)?.parent()?;
                Some(BodyPair(BodyHandle(body_a), BodyHandle(body_b)))
            })
            .collect();

        self.touching = now;
        ended
    }

    /// Convenience for callers without a pre-step hook: advance and run
    /// every due step, collecting ended pairs.
    pub fn step(&mut self, frame_dt: f32) -> Vec<BodyPair> {
        let steps = self.advance(frame_dt);
        let mut ended = Vec::new();
        for _ in 0..steps {
            ended.extend(self.step_once());
        }
        ended
    }
}

impl Default for PhysicsWorld2d {
    fn default() -> Self {
        Self::new()
    }
}
