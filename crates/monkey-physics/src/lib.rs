//! Monkey Physics -- a thin rapier2d adapter for the tower game.
//!
//! The game core never talks to rapier directly. It creates bodies through a
//! [`BodyDesc`], gets back an opaque [`BodyId`], and mutates them through the
//! handful of operations the gameplay needs: static toggling, translation,
//! velocity and impulse changes, and rope constraints. Collision-started
//! events come back from [`PhysicsWorld::step`] as [`CollisionPair`]s tagged
//! with each body's [`BodyRole`].
//!
//! # Coordinates
//!
//! Screen space: `x` grows to the right, `y` grows downward. Gravity is
//! therefore a positive `y` vector.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. Collision pairs and body
//! iteration are sorted by [`BodyId`] so identical inputs produce identical
//! event sequences.
//!
//! ```
//! use monkey_physics::{BodyDesc, BodyRole, PhysicsWorld};
//!
//! let mut physics = PhysicsWorld::new(0.0, 1000.0);
//! let block = physics.spawn(&BodyDesc::block(100.0, 100.0, 25.0, 25.0));
//! physics.step(1.0 / 60.0);
//! let t = physics.transform(block).unwrap();
//! assert!(t.y > 100.0);
//! assert_eq!(physics.role(block), Some(BodyRole::Block));
//! ```

#![deny(unsafe_code)]

use std::collections::{BTreeMap, HashMap};

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers and descriptors
// ---------------------------------------------------------------------------

/// Opaque identifier of a body owned by a [`PhysicsWorld`].
///
/// Ids are allocated from a monotonically increasing counter and never
/// reused, so a stale id simply stops resolving after [`PhysicsWorld::despawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Identifier of a rope constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RopeId(pub u64);

/// Gameplay role tag attached to every body. Collision pairs are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyRole {
    /// The floor the tower stands on.
    Ground,
    /// Invisible fixed point the rope hangs from.
    Anchor,
    /// A tower block, hanging or placed.
    Block,
    /// A thrown hazard projectile.
    Rock,
}

/// How the solver treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Fully simulated.
    Dynamic,
    /// Immovable; only moved by explicit translation.
    Static,
}

/// Collider shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Box with half-extents.
    Box { half_width: f64, half_height: f64 },
    /// Circle with radius.
    Circle { radius: f64 },
}

impl Shape {
    fn area(&self) -> f64 {
        match *self {
            Shape::Box {
                half_width,
                half_height,
            } => 4.0 * half_width * half_height,
            Shape::Circle { radius } => std::f64::consts::PI * radius * radius,
        }
    }

    /// Half-extents of the axis-aligned box enclosing this shape at `angle`.
    fn aabb_half_extents(&self, angle: f64) -> (f64, f64) {
        match *self {
            Shape::Box {
                half_width,
                half_height,
            } => {
                let (s, c) = angle.sin_cos();
                (
                    c.abs() * half_width + s.abs() * half_height,
                    s.abs() * half_width + c.abs() * half_height,
                )
            }
            Shape::Circle { radius } => (radius, radius),
        }
    }
}

/// Everything needed to create a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Gameplay tag reported back in [`CollisionPair`]s.
    pub role: BodyRole,
    pub kind: BodyKind,
    pub shape: Shape,
    /// Centre, in pixels.
    pub x: f64,
    pub y: f64,
    /// Rotation in radians.
    pub angle: f64,
    /// Initial linear velocity, in pixels per second.
    pub vx: f64,
    pub vy: f64,
    /// Mass per square pixel.
    pub density: f64,
    pub friction: f64,
    pub restitution: f64,
    /// Multiplier on world gravity; `0.0` flies straight.
    pub gravity_scale: f64,
}

impl BodyDesc {
    /// A dynamic square-ish tower block centred at `(x, y)`.
    pub fn block(x: f64, y: f64, half_width: f64, half_height: f64) -> Self {
        Self {
            role: BodyRole::Block,
            kind: BodyKind::Dynamic,
            shape: Shape::Box {
                half_width,
                half_height,
            },
            x,
            y,
            angle: 0.0,
            vx: 0.0,
            vy: 0.0,
            density: 0.5,
            friction: 1.0,
            restitution: 0.0,
            gravity_scale: 1.0,
        }
    }

    /// A static floor slab.
    pub fn ground(x: f64, y: f64, half_width: f64, half_height: f64) -> Self {
        Self {
            role: BodyRole::Ground,
            kind: BodyKind::Static,
            friction: 1.0,
            ..Self::block(x, y, half_width, half_height)
        }
    }

    /// A fixed zero-size anchor point for ropes.
    pub fn anchor(x: f64, y: f64) -> Self {
        Self {
            role: BodyRole::Anchor,
            kind: BodyKind::Static,
            shape: Shape::Circle { radius: 1.0 },
            ..Self::block(x, y, 1.0, 1.0)
        }
    }

    /// A gravity-free projectile moving with `(vx, vy)`.
    pub fn rock(x: f64, y: f64, radius: f64, vx: f64, vy: f64) -> Self {
        Self {
            role: BodyRole::Rock,
            kind: BodyKind::Dynamic,
            shape: Shape::Circle { radius },
            x,
            y,
            angle: 0.0,
            vx,
            vy,
            density: 1.0,
            friction: 0.3,
            restitution: 0.1,
            gravity_scale: 0.0,
        }
    }
}

/// Position and rotation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTransform {
    pub x: f64,
    pub y: f64,
    /// Rotation in radians, in `(-PI, PI]`.
    pub angle: f64,
}

/// Axis-aligned bounds of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of the given half-extents centred at `(x, y)`.
    pub fn centered(x: f64, y: f64, half_width: f64, half_height: f64) -> Self {
        Self {
            min_x: x - half_width,
            min_y: y - half_height,
            max_x: x + half_width,
            max_y: y + half_height,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Length of the horizontal overlap with `other` (negative when apart).
    pub fn horizontal_overlap(&self, other: &Bounds) -> f64 {
        self.max_x.min(other.max_x) - self.min_x.max(other.min_x)
    }
}

// ---------------------------------------------------------------------------
// CollisionPair
// ---------------------------------------------------------------------------

/// Two bodies that started touching during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub body_a: BodyId,
    pub role_a: BodyRole,
    pub body_b: BodyId,
    pub role_b: BodyRole,
}

impl CollisionPair {
    /// If this pair is one `first` body and one `second` body, return them in
    /// that order.
    pub fn split(&self, first: BodyRole, second: BodyRole) -> Option<(BodyId, BodyId)> {
        if self.role_a == first && self.role_b == second {
            Some((self.body_a, self.body_b))
        } else if self.role_b == first && self.role_a == second {
            Some((self.body_b, self.body_a))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

struct BodyEntry {
    handle: RigidBodyHandle,
    role: BodyRole,
    shape: Shape,
    mass: f64,
}

/// Owns the rapier2d simulation and the id <-> handle bookkeeping.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    bodies: BTreeMap<BodyId, BodyEntry>,
    collider_to_body: HashMap<ColliderHandle, BodyId>,
    ropes: BTreeMap<RopeId, (ImpulseJointHandle, BodyId)>,
    next_body: u64,
    next_rope: u64,
}

impl PhysicsWorld {
    /// Create a physics world with the given gravity vector.
    pub fn new(gravity_x: f64, gravity_y: f64) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![gravity_x as Real, gravity_y as Real],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bodies: BTreeMap::new(),
            collider_to_body: HashMap::new(),
            ropes: BTreeMap::new(),
            next_body: 0,
            next_rope: 0,
        }
    }

    /// Scale rapier's internal tolerances to a world measured in
    /// `units_per_meter` (pixels per meter for this game).
    ///
    /// Contact slop and the penetration-recovery speed are expressed in
    /// meters by default, which leaves pixel-sized bodies sinking into each
    /// other on impact.
    pub fn with_length_unit(mut self, units_per_meter: f64) -> Self {
        self.integration_params.length_unit = units_per_meter as Real;
        self
    }

    /// Create a body and its collider.
    pub fn spawn(&mut self, desc: &BodyDesc) -> BodyId {
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let rb = builder
            .translation(vector![desc.x as Real, desc.y as Real])
            .rotation(desc.angle as Real)
            .linvel(vector![desc.vx as Real, desc.vy as Real])
            .gravity_scale(desc.gravity_scale as Real)
            .build();
        let handle = self.rigid_body_set.insert(rb);

        let shape = match desc.shape {
            Shape::Box {
                half_width,
                half_height,
            } => SharedShape::cuboid(half_width as Real, half_height as Real),
            Shape::Circle { radius } => SharedShape::ball(radius as Real),
        };
        let collider = ColliderBuilder::new(shape)
            .density(desc.density as Real)
            .friction(desc.friction as Real)
            .restitution(desc.restitution as Real)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.collider_to_body.insert(collider_handle, id);
        self.bodies.insert(
            id,
            BodyEntry {
                handle,
                role: desc.role,
                shape: desc.shape,
                mass: desc.density * desc.shape.area(),
            },
        );
        tracing::trace!(%id, role = ?desc.role, x = desc.x, y = desc.y, "spawned body");
        id
    }

    /// Remove a body, its collider, and any rope attached to it.
    ///
    /// Unknown ids are ignored.
    pub fn despawn(&mut self, id: BodyId) {
        let Some(entry) = self.bodies.remove(&id) else {
            return;
        };
        self.rigid_body_set.remove(
            entry.handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.collider_to_body.retain(|_, body| *body != id);
        // rapier already dropped the joints together with the body.
        self.ropes.retain(|_, (_, body)| *body != id);
    }

    /// Bind `body` to `anchor` with a rigid rope of the given length.
    ///
    /// Returns `None` if either body is unknown.
    pub fn attach_rope(&mut self, anchor: BodyId, body: BodyId, length: f64) -> Option<RopeId> {
        let anchor_handle = self.bodies.get(&anchor)?.handle;
        let body_handle = self.bodies.get(&body)?.handle;
        let joint = RopeJointBuilder::new(length as Real)
            .local_anchor1(point![0.0, 0.0])
            .local_anchor2(point![0.0, 0.0])
            .build();
        let handle = self
            .impulse_joint_set
            .insert(anchor_handle, body_handle, joint, true);
        let id = RopeId(self.next_rope);
        self.next_rope += 1;
        self.ropes.insert(id, (handle, body));
        Some(id)
    }

    /// Destroy a rope. Unknown ids are ignored.
    pub fn detach_rope(&mut self, rope: RopeId) {
        if let Some((handle, _)) = self.ropes.remove(&rope) {
            self.impulse_joint_set.remove(handle, true);
        }
    }

    /// Freeze (`true`) or unfreeze (`false`) a body.
    ///
    /// Freezing also clears linear and angular velocity.
    pub fn set_static(&mut self, id: BodyId, frozen: bool) {
        let Some(rb) = self.body_mut(id) else {
            return;
        };
        if frozen {
            rb.set_body_type(RigidBodyType::Fixed, true);
            rb.set_linvel(vector![0.0, 0.0], false);
            rb.set_angvel(0.0, false);
        } else {
            rb.set_body_type(RigidBodyType::Dynamic, true);
        }
    }

    pub fn set_position(&mut self, id: BodyId, x: f64, y: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_translation(vector![x as Real, y as Real], true);
        }
    }

    pub fn set_rotation(&mut self, id: BodyId, angle: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_rotation(Rotation::new(angle as Real), true);
        }
    }

    /// Move a body by `(dx, dy)`, regardless of whether it is static.
    pub fn translate(&mut self, id: BodyId, dx: f64, dy: f64) {
        if let Some(rb) = self.body_mut(id) {
            let t = *rb.translation();
            rb.set_translation(vector![t.x + dx as Real, t.y + dy as Real], true);
        }
    }

    pub fn set_linvel(&mut self, id: BodyId, vx: f64, vy: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_linvel(vector![vx as Real, vy as Real], true);
        }
    }

    pub fn set_angvel(&mut self, id: BodyId, angvel: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_angvel(angvel as Real, true);
        }
    }

    pub fn set_gravity_scale(&mut self, id: BodyId, scale: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_gravity_scale(scale as Real, true);
        }
    }

    /// Apply an instantaneous impulse. Has no effect on static bodies.
    pub fn apply_impulse(&mut self, id: BodyId, ix: f64, iy: f64) {
        if let Some(rb) = self.body_mut(id) {
            rb.apply_impulse(vector![ix as Real, iy as Real], true);
        }
    }

    pub fn transform(&self, id: BodyId) -> Option<BodyTransform> {
        let rb = self.body(id)?;
        let t = rb.translation();
        Some(BodyTransform {
            x: t.x as f64,
            y: t.y as f64,
            angle: rb.rotation().angle() as f64,
        })
    }

    /// Linear velocity `(vx, vy)`.
    pub fn velocity(&self, id: BodyId) -> Option<(f64, f64)> {
        let rb = self.body(id)?;
        let v = rb.linvel();
        Some((v.x as f64, v.y as f64))
    }

    pub fn angular_velocity(&self, id: BodyId) -> Option<f64> {
        self.body(id).map(|rb| rb.angvel() as f64)
    }

    /// Axis-aligned bounds computed from the current transform.
    pub fn bounds(&self, id: BodyId) -> Option<Bounds> {
        let entry = self.bodies.get(&id)?;
        let t = self.transform(id)?;
        let (hw, hh) = entry.shape.aabb_half_extents(t.angle);
        Some(Bounds::centered(t.x, t.y, hw, hh))
    }

    /// Mass derived from the spawn density and shape area.
    pub fn mass(&self, id: BodyId) -> Option<f64> {
        self.bodies.get(&id).map(|e| e.mass)
    }

    pub fn shape(&self, id: BodyId) -> Option<Shape> {
        self.bodies.get(&id).map(|e| e.shape)
    }

    pub fn is_static(&self, id: BodyId) -> Option<bool> {
        self.body(id).map(|rb| rb.is_fixed())
    }

    pub fn role(&self, id: BodyId) -> Option<BodyRole> {
        self.bodies.get(&id).map(|e| e.role)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Every live body id, ascending.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn rope_count(&self) -> usize {
        self.ropes.len()
    }

    /// Step the simulation by `dt` seconds.
    ///
    /// Returns the pairs that started touching during the step, sorted by
    /// `(min id, max id)`.
    pub fn step(&mut self, dt: f64) -> Vec<CollisionPair> {
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut collisions = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_to_body.get(&h1).copied();
                let b = self.collider_to_body.get(&h2).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    if let (Some(role_a), Some(role_b)) = (self.role(a), self.role(b)) {
                        collisions.push(CollisionPair {
                            body_a: a,
                            role_a,
                            body_b: b,
                            role_b,
                        });
                    }
                }
            }
        }

        // Channel delivery order is not guaranteed.
        collisions.sort_by_key(|c| (c.body_a.min(c.body_b), c.body_a.max(c.body_b)));
        collisions
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        let handle = self.bodies.get(&id)?.handle;
        self.rigid_body_set.get(handle)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.bodies.get(&id)?.handle;
        self.rigid_body_set.get_mut(handle)
    }
}

impl Default for PhysicsWorld {
    /// Screen-space gravity tuned for pixel units.
    fn default() -> Self {
        Self::new(0.0, 1000.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn spawn_and_despawn() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let id = pw.spawn(&BodyDesc::block(0.0, 0.0, 25.0, 25.0));
        assert!(pw.contains(id));
        assert_eq!(pw.body_count(), 1);
        pw.despawn(id);
        assert!(!pw.contains(id));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn despawn_unknown_is_noop() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        pw.despawn(BodyId(42));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let a = pw.spawn(&BodyDesc::block(0.0, 0.0, 1.0, 1.0));
        pw.despawn(a);
        let b = pw.spawn(&BodyDesc::block(0.0, 0.0, 1.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(pw.body_ids().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn gravity_pulls_down_in_screen_space() {
        let mut pw = PhysicsWorld::new(0.0, 1000.0);
        let id = pw.spawn(&BodyDesc::block(0.0, 0.0, 25.0, 25.0));
        for _ in 0..30 {
            pw.step(DT);
        }
        let t = pw.transform(id).unwrap();
        assert!(t.y > 50.0, "block should fall toward +y, got y={}", t.y);
    }

    #[test]
    fn fast_block_comes_to_rest_on_the_ground_with_pixel_units() {
        let mut pw = PhysicsWorld::new(0.0, 3000.0).with_length_unit(100.0);
        pw.spawn(&BodyDesc::ground(200.0, 490.0, 200.0, 10.0));
        let block = pw.spawn(&BodyDesc::block(200.0, 130.0, 25.0, 25.0));
        for _ in 0..36 {
            pw.step(DT);
        }
        // Surface at 480, so the centre rests at 455.
        let t = pw.transform(block).unwrap();
        assert!((t.y - 455.0).abs() < 6.0, "block should rest on the ground, y={}", t.y);
        let (_, vy) = pw.velocity(block).unwrap();
        assert!(vy.abs() < 100.0, "block should have stopped, vy={vy}");
    }

    #[test]
    fn static_body_does_not_move() {
        let mut pw = PhysicsWorld::new(0.0, 1000.0);
        let id = pw.spawn(&BodyDesc::ground(0.0, 100.0, 200.0, 10.0));
        for _ in 0..30 {
            pw.step(DT);
        }
        assert_eq!(pw.transform(id).unwrap().y, 100.0);
        assert_eq!(pw.is_static(id), Some(true));
    }

    #[test]
    fn freeze_clears_velocity_and_unfreeze_restores_dynamics() {
        let mut pw = PhysicsWorld::new(0.0, 1000.0);
        let id = pw.spawn(&BodyDesc::block(0.0, 0.0, 25.0, 25.0));
        pw.set_linvel(id, 30.0, 40.0);
        pw.set_static(id, true);
        assert_eq!(pw.is_static(id), Some(true));
        assert_eq!(pw.velocity(id), Some((0.0, 0.0)));

        pw.step(DT);
        assert_eq!(pw.transform(id).unwrap().y, 0.0);

        pw.set_static(id, false);
        assert_eq!(pw.is_static(id), Some(false));
        for _ in 0..10 {
            pw.step(DT);
        }
        assert!(pw.transform(id).unwrap().y > 0.0);
    }

    #[test]
    fn translate_moves_static_bodies() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let id = pw.spawn(&BodyDesc::ground(10.0, 20.0, 5.0, 5.0));
        pw.translate(id, 0.0, 15.0);
        let t = pw.transform(id).unwrap();
        assert!((t.x - 10.0).abs() < 1e-4);
        assert!((t.y - 35.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_follow_rotation() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let id = pw.spawn(&BodyDesc::block(0.0, 0.0, 25.0, 10.0));
        let b = pw.bounds(id).unwrap();
        assert!((b.width() - 50.0).abs() < 1e-3);
        assert!((b.height() - 20.0).abs() < 1e-3);

        pw.set_rotation(id, std::f64::consts::FRAC_PI_2);
        let b = pw.bounds(id).unwrap();
        assert!((b.width() - 20.0).abs() < 1e-3);
        assert!((b.height() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn horizontal_overlap() {
        let a = Bounds::centered(100.0, 0.0, 25.0, 25.0);
        let b = Bounds::centered(120.0, 0.0, 25.0, 25.0);
        assert!((a.horizontal_overlap(&b) - 30.0).abs() < 1e-9);
        let c = Bounds::centered(200.0, 0.0, 25.0, 25.0);
        assert!(a.horizontal_overlap(&c) < 0.0);
    }

    #[test]
    fn mass_uses_density_and_area() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let id = pw.spawn(&BodyDesc::block(0.0, 0.0, 25.0, 25.0));
        assert_eq!(pw.mass(id), Some(0.5 * 2500.0));
    }

    #[test]
    fn rope_attach_and_detach() {
        let mut pw = PhysicsWorld::new(0.0, 1000.0);
        let anchor = pw.spawn(&BodyDesc::anchor(0.0, 0.0));
        let block = pw.spawn(&BodyDesc::block(0.0, 100.0, 25.0, 25.0));
        let rope = pw.attach_rope(anchor, block, 100.0).unwrap();
        assert_eq!(pw.rope_count(), 1);

        for _ in 0..60 {
            pw.step(DT);
        }
        let t = pw.transform(block).unwrap();
        let dist = (t.x * t.x + t.y * t.y).sqrt();
        assert!(dist < 110.0, "rope should hold the block, dist={dist}");

        pw.detach_rope(rope);
        assert_eq!(pw.rope_count(), 0);
        for _ in 0..60 {
            pw.step(DT);
        }
        assert!(pw.transform(block).unwrap().y > 200.0);
    }

    #[test]
    fn despawn_drops_attached_rope() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let anchor = pw.spawn(&BodyDesc::anchor(0.0, 0.0));
        let block = pw.spawn(&BodyDesc::block(0.0, 100.0, 25.0, 25.0));
        pw.attach_rope(anchor, block, 100.0).unwrap();
        pw.despawn(block);
        assert_eq!(pw.rope_count(), 0);
    }

    #[test]
    fn attach_rope_to_unknown_body_fails() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let anchor = pw.spawn(&BodyDesc::anchor(0.0, 0.0));
        assert!(pw.attach_rope(anchor, BodyId(99), 10.0).is_none());
    }

    #[test]
    fn rock_ignores_gravity() {
        let mut pw = PhysicsWorld::new(0.0, 1000.0);
        let rock = pw.spawn(&BodyDesc::rock(0.0, 0.0, 10.0, 300.0, 0.0));
        for _ in 0..30 {
            pw.step(DT);
        }
        let t = pw.transform(rock).unwrap();
        assert!(t.x > 100.0);
        assert!(t.y.abs() < 1.0, "rock should fly straight, y={}", t.y);
    }

    #[test]
    fn rock_hitting_static_block_reports_roles() {
        let mut pw = PhysicsWorld::new(0.0, 0.0);
        let block = pw.spawn(&BodyDesc {
            kind: BodyKind::Static,
            ..BodyDesc::block(100.0, 0.0, 25.0, 25.0)
        });
        let rock = pw.spawn(&BodyDesc::rock(0.0, 0.0, 10.0, 400.0, 0.0));

        let mut pairs = Vec::new();
        for _ in 0..60 {
            pairs.extend(pw.step(DT));
        }
        let hit = pairs
            .iter()
            .find_map(|p| p.split(BodyRole::Rock, BodyRole::Block))
            .expect("rock should hit the block");
        assert_eq!(hit, (rock, block));
    }

    #[test]
    fn collision_pair_split_is_order_independent() {
        let pair = CollisionPair {
            body_a: BodyId(1),
            role_a: BodyRole::Block,
            body_b: BodyId(2),
            role_b: BodyRole::Rock,
        };
        assert_eq!(
            pair.split(BodyRole::Rock, BodyRole::Block),
            Some((BodyId(2), BodyId(1)))
        );
        assert_eq!(pair.split(BodyRole::Ground, BodyRole::Block), None);
    }

    #[test]
    fn identical_runs_are_deterministic() {
        fn run() -> Vec<(f64, f64)> {
            let mut pw = PhysicsWorld::new(0.0, 1000.0);
            pw.spawn(&BodyDesc::ground(200.0, 400.0, 200.0, 10.0));
            let a = pw.spawn(&BodyDesc::block(190.0, 0.0, 25.0, 25.0));
            let b = pw.spawn(&BodyDesc::block(215.0, -80.0, 25.0, 25.0));
            let mut out = Vec::new();
            for _ in 0..120 {
                pw.step(DT);
                for id in [a, b] {
                    let t = pw.transform(id).unwrap();
                    out.push((t.x, t.y));
                }
            }
            out
        }
        assert_eq!(run(), run());
    }
}
