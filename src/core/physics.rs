use glam::{Quat, Vec3};
use log::warn;

use crate::api::types::WorldPose;

#[cfg(feature = "physics")]
use rapier3d::prelude::*;

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

#[cfg(feature = "physics")]
fn vec3_to_na(v: Vec3) -> rapier3d::na::Vector3<f32> {
    rapier3d::na::Vector3::new(v.x, v.y, v.z)
}

#[cfg(feature = "physics")]
fn quat_to_na(q: Quat) -> rapier3d::na::UnitQuaternion<f32> {
    rapier3d::na::UnitQuaternion::from_quaternion(rapier3d::na::Quaternion::new(
        q.w, q.x, q.y, q.z,
    ))
}

#[cfg(feature = "physics")]
fn na_iso_to_pose(iso: &rapier3d::na::Isometry3<f32>) -> WorldPose {
    let t = iso.translation;
    let r = iso.rotation;
    WorldPose {
        position: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(r.i, r.j, r.k, r.w),
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Opaque handle pair referencing a rigid body and its collider.
/// Only the facade hands these out; under the inert facade none exist.
#[derive(Debug, Clone, Copy)]
pub struct BodyHandle {
    #[cfg(feature = "physics")]
    pub body: RigidBodyHandle,
    #[cfg(feature = "physics")]
    pub collider: ColliderHandle,
}

/// Wraps the rigid-body simulation behind a fixed capability set: create,
/// kinematic/dynamic toggle, transform read/write, advance.
///
/// Two variants, selected once at setup and never branched on at call
/// sites: a rapier3d-backed world and an inert no-op world. The inert
/// variant never hands out body handles, so downstream code only ever
/// checks handle presence or `is_fallback`.
pub enum PhysicsFacade {
    #[cfg(feature = "physics")]
    Rapier(RapierWorld),
    Inert,
}

impl PhysicsFacade {
    /// Create a simulation-backed facade with the given gravity, or the
    /// inert facade when the engine is compiled out.
    pub fn new(gravity: Vec3) -> Self {
        #[cfg(feature = "physics")]
        {
            PhysicsFacade::Rapier(RapierWorld::new(gravity))
        }
        #[cfg(not(feature = "physics"))]
        {
            let _ = gravity;
            warn!("physics engine unavailable, running in visual-only fallback mode");
            PhysicsFacade::Inert
        }
    }

    /// The no-op facade. Body creation yields no handles, `advance` does
    /// nothing, reads return the identity pose.
    pub fn inert() -> Self {
        PhysicsFacade::Inert
    }

    /// Whether this facade runs without a real simulation.
    pub fn is_fallback(&self) -> bool {
        matches!(self, PhysicsFacade::Inert)
    }

    /// Step the simulation by `dt` seconds. No-op under fallback.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn advance(&mut self, dt: f32) {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.step(dt),
            PhysicsFacade::Inert => {}
        }
    }

    /// Create a dynamic cube body with a `half_extent` cuboid collider.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn create_dynamic_body(
        &mut self,
        position: Vec3,
        half_extent: f32,
        friction: f32,
    ) -> Option<BodyHandle> {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => {
                Some(world.create_body(RigidBodyType::Dynamic, position, Vec3::splat(half_extent), friction))
            }
            PhysicsFacade::Inert => None,
        }
    }

    /// Create a fixed body with the given cuboid collider half extents.
    /// Used for the ground slab and obstacles.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn create_static_body(&mut self, position: Vec3, half_extents: Vec3) -> Option<BodyHandle> {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => {
                Some(world.create_body(RigidBodyType::Fixed, position, half_extents, 0.5))
            }
            PhysicsFacade::Inert => None,
        }
    }

    /// Hand the body's transform to the animation: kinematic bodies are
    /// externally driven and ignore forces and collisions.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn set_body_kinematic(&mut self, body: &BodyHandle) {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => {
                world.set_body_type(body, RigidBodyType::KinematicPositionBased)
            }
            PhysicsFacade::Inert => {}
        }
    }

    /// Give the transform back to the simulation.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn set_body_dynamic(&mut self, body: &BodyHandle) {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.set_body_type(body, RigidBodyType::Dynamic),
            PhysicsFacade::Inert => {}
        }
    }

    /// Write position and rotation to a body. Best-effort: a stale handle
    /// is logged and ignored, the visual transform stays authoritative.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn write_transform(&mut self, body: &BodyHandle, position: Vec3, rotation: Quat) {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.write_transform(body, position, rotation),
            PhysicsFacade::Inert => {}
        }
    }

    /// Set a body's linear velocity. Used when repositioning the cube.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn set_velocity(&mut self, body: &BodyHandle, velocity: Vec3) {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.set_velocity(body, velocity),
            PhysicsFacade::Inert => {}
        }
    }

    /// Read a body's current pose. Identity pose for stale handles or
    /// under the inert facade.
    #[cfg_attr(not(feature = "physics"), allow(unused_variables))]
    pub fn read_transform(&self, body: &BodyHandle) -> WorldPose {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.read_transform(body),
            PhysicsFacade::Inert => WorldPose::IDENTITY,
        }
    }

    /// Number of rigid bodies in the simulation (0 under fallback).
    pub fn body_count(&self) -> usize {
        match self {
            #[cfg(feature = "physics")]
            PhysicsFacade::Rapier(world) => world.body_count(),
            PhysicsFacade::Inert => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

/// Wraps all rapier3d boilerplate into a single struct.
#[cfg(feature = "physics")]
pub struct RapierWorld {
    gravity: rapier3d::na::Vector3<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

#[cfg(feature = "physics")]
impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: vec3_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    fn create_body(
        &mut self,
        body_type: RigidBodyType,
        position: Vec3,
        half_extents: Vec3,
        friction: f32,
    ) -> BodyHandle {
        let rb = RigidBodyBuilder::new(body_type)
            .translation(vec3_to_na(position))
            .build();
        let body = self.bodies.insert(rb);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(friction)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        BodyHandle { body, collider }
    }

    fn set_body_type(&mut self, handle: &BodyHandle, body_type: RigidBodyType) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_body_type(body_type, true);
        } else {
            warn!("body-type toggle on a stale handle, ignoring");
        }
    }

    fn write_transform(&mut self, handle: &BodyHandle, position: Vec3, rotation: Quat) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            let iso = rapier3d::na::Isometry3::from_parts(
                rapier3d::na::Translation3::new(position.x, position.y, position.z),
                quat_to_na(rotation),
            );
            rb.set_position(iso, true);
        } else {
            warn!("transform write to a stale handle, ignoring");
        }
    }

    fn set_velocity(&mut self, handle: &BodyHandle, velocity: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_linvel(vec3_to_na(velocity), true);
        }
    }

    fn read_transform(&self, handle: &BodyHandle) -> WorldPose {
        self.bodies
            .get(handle.body)
            .map(|rb| na_iso_to_pose(rb.position()))
            .unwrap_or(WorldPose::IDENTITY)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_facade_is_fallback_and_handleless() {
        let mut facade = PhysicsFacade::inert();
        assert!(facade.is_fallback());
        assert!(facade.create_dynamic_body(Vec3::ZERO, 0.5, 0.1).is_none());
        assert!(facade
            .create_static_body(Vec3::ZERO, Vec3::new(5.0, 0.01, 5.0))
            .is_none());
        assert_eq!(facade.body_count(), 0);
        facade.advance(1.0 / 60.0); // must not panic
    }

    #[cfg(feature = "physics")]
    mod rapier {
        use super::*;

        const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

        #[test]
        fn real_facade_is_not_fallback() {
            let facade = PhysicsFacade::new(GRAVITY);
            assert!(!facade.is_fallback());
        }

        #[test]
        fn dynamic_body_falls_under_gravity() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            let body = facade
                .create_dynamic_body(Vec3::new(0.0, 5.0, 0.0), 0.5, 0.1)
                .unwrap();

            for _ in 0..30 {
                facade.advance(1.0 / 60.0);
            }
            let pose = facade.read_transform(&body);
            assert!(pose.position.y < 5.0, "body should fall: y={}", pose.position.y);
        }

        #[test]
        fn static_body_does_not_move() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            let body = facade
                .create_static_body(Vec3::new(0.5, 0.0, 0.5), Vec3::new(5.0, 0.01, 5.0))
                .unwrap();

            for _ in 0..30 {
                facade.advance(1.0 / 60.0);
            }
            let pose = facade.read_transform(&body);
            assert!((pose.position - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-4);
        }

        #[test]
        fn kinematic_body_ignores_gravity_and_accepts_writes() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            let body = facade
                .create_dynamic_body(Vec3::new(0.0, 0.5, 0.0), 0.5, 0.1)
                .unwrap();
            facade.set_body_kinematic(&body);

            let target = Vec3::new(0.3, 0.5, -0.2);
            let rot = Quat::from_axis_angle(Vec3::X, 0.4);
            facade.write_transform(&body, target, rot);
            for _ in 0..10 {
                facade.advance(1.0 / 60.0);
            }

            let pose = facade.read_transform(&body);
            assert!((pose.position - target).length() < 1e-4, "kinematic body drifted");
            assert!(pose.rotation.dot(rot).abs() > 0.9999);
        }

        #[test]
        fn dynamic_toggle_restores_simulation_authority() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            let body = facade
                .create_dynamic_body(Vec3::new(0.0, 5.0, 0.0), 0.5, 0.1)
                .unwrap();
            facade.set_body_kinematic(&body);
            for _ in 0..10 {
                facade.advance(1.0 / 60.0);
            }
            assert!((facade.read_transform(&body).position.y - 5.0).abs() < 1e-4);

            facade.set_body_dynamic(&body);
            for _ in 0..30 {
                facade.advance(1.0 / 60.0);
            }
            assert!(facade.read_transform(&body).position.y < 5.0);
        }

        #[test]
        fn cube_rests_on_ground_slab() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            facade.create_static_body(Vec3::new(0.5, 0.0, 0.5), Vec3::new(5.0, 0.01, 5.0));
            let cube = facade
                .create_dynamic_body(Vec3::new(0.0, 0.6, 0.0), 0.5, 0.1)
                .unwrap();

            for _ in 0..120 {
                facade.advance(1.0 / 60.0);
            }
            let y = facade.read_transform(&cube).position.y;
            assert!(
                (y - 0.5).abs() < 0.1,
                "cube should settle near rest height, got y={y}"
            );
        }

        #[test]
        fn set_velocity_zeroes_motion() {
            let mut facade = PhysicsFacade::new(GRAVITY);
            let body = facade
                .create_dynamic_body(Vec3::new(0.0, 5.0, 0.0), 0.5, 0.1)
                .unwrap();
            for _ in 0..10 {
                facade.advance(1.0 / 60.0);
            }
            facade.set_velocity(&body, Vec3::ZERO);
            let before = facade.read_transform(&body).position;
            facade.advance(1.0 / 60.0);
            let after = facade.read_transform(&body).position;
            // One step of re-accumulated gravity only; no carried-over speed.
            assert!((after - before).length() < 0.01);
        }
    }
}
