// systems/roll.rs
//
// The roll-motion state machine. Translates a discrete directional intent
// into a validated one-cell transition plus a 90-degree rotation about the
// leading top edge, synchronized with a linear position interpolation.
// While a roll is in flight the physics body (if any) is driven
// kinematically; on completion simulation authority is handed back.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use log::debug;

use crate::api::types::{Direction, GridCell, WorldPose};
use crate::components::cube::{CubeEntity, HALF_EXTENT};
use crate::core::grid;
use crate::core::obstacles::ObstacleRegistry;
use crate::core::physics::PhysicsFacade;
use crate::extensions::easing::Easing;

/// Transient per-roll state. Exists only while a roll is in flight;
/// at most one is ever alive.
#[derive(Debug, Clone)]
pub struct RollAnimation {
    elapsed: f32,
    duration: f32,
    start_rotation: Quat,
    end_rotation: Quat,
    start_position: Vec3,
    end_position: Vec3,
    /// Horizontal unit axis of the 90° turn.
    pub rotation_axis: Vec3,
    /// Midpoint of the leading top edge the turn is computed about.
    pub pivot_point: Vec3,
    /// Whether a kinematic physics body mirrors this animation.
    drives_body: bool,
}

/// Idle ⇄ Animating controller for the cube's grid-locked rolls.
///
/// `request_move` validates and starts a roll; `tick` advances it with
/// caller-supplied frame deltas. Rejected moves are silent no-ops, never
/// errors. Once a roll starts it always runs to completion — there is no
/// cancellation path, and facade failures never stall it.
pub struct RollMotionController {
    animation: Option<RollAnimation>,
    moving: bool,
    duration: f32,
    easing: Easing,
    grid_size: f32,
    grid_offset: f32,
    initial_cell: GridCell,
    win_cell: Option<GridCell>,
}

impl RollMotionController {
    pub fn new(
        duration: f32,
        grid_size: f32,
        grid_offset: f32,
        initial_cell: GridCell,
        win_cell: Option<GridCell>,
    ) -> Self {
        Self {
            animation: None,
            moving: false,
            duration: duration.max(1e-3),
            easing: Easing::QuadInOut,
            grid_size,
            grid_offset,
            initial_cell,
            win_cell,
        }
    }

    /// Whether a roll animation is in flight. The frame driver skips the
    /// physics advance while this holds.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// The mutual-exclusion guard: set at move acceptance, cleared at
    /// completion. Win checks must not run while it holds.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Try to start a one-cell roll in `direction`. Returns whether the
    /// move was accepted. Rejection (busy, out of bounds, blocked) leaves
    /// every piece of state untouched.
    pub fn request_move(
        &mut self,
        direction: Direction,
        cube: &mut CubeEntity,
        obstacles: &ObstacleRegistry,
        physics: &mut PhysicsFacade,
    ) -> bool {
        if self.moving || self.animation.is_some() {
            return false;
        }

        // While idle the simulation owns a bound body, so its transform is
        // the truer current position; visually-only cubes use the pose.
        let current = match (&cube.body, physics.is_fallback()) {
            (Some(body), false) => physics.read_transform(body).position,
            _ => cube.pose.position,
        };

        let target = current + direction.step(self.grid_size);
        if !grid::is_within_bounds(target, self.grid_offset) {
            debug!("move {direction:?} rejected: out of bounds");
            return false;
        }

        let target_cell = grid::world_to_cell(target);
        let exempt = Some(target_cell) == self.win_cell || target_cell == self.initial_cell;
        if !exempt && !obstacles.is_free(target_cell) {
            debug!(
                "move {direction:?} rejected: obstacle at ({}, {})",
                target_cell.x, target_cell.z
            );
            return false;
        }

        let rotation_axis = grid::rotation_axis_for(direction);
        let pivot_point = grid::pivot_for(direction, current, HALF_EXTENT);
        let start_rotation = cube.pose.rotation;
        let end_rotation =
            (Quat::from_axis_angle(rotation_axis, FRAC_PI_2) * start_rotation).normalize();

        let drives_body = cube.body.is_some() && !physics.is_fallback();
        if drives_body {
            if let Some(body) = &cube.body {
                physics.set_body_kinematic(body);
            }
        }

        self.animation = Some(RollAnimation {
            elapsed: 0.0,
            duration: self.duration,
            start_rotation,
            end_rotation,
            start_position: current,
            // Flat trajectory: the end height is pinned to the start height.
            end_position: Vec3::new(target.x, current.y, target.z),
            rotation_axis,
            pivot_point,
            drives_body,
        });
        self.moving = true;
        true
    }

    /// Advance the active roll by `dt` seconds of wall-clock time.
    /// Returns true exactly once, on the tick that completes the roll.
    pub fn tick(&mut self, dt: f32, cube: &mut CubeEntity, physics: &mut PhysicsFacade) -> bool {
        let Some(anim) = self.animation.as_mut() else {
            return false;
        };

        anim.elapsed += dt;
        let raw_progress = (anim.elapsed / anim.duration).min(1.0);
        let progress = self.easing.apply(raw_progress);

        let rotation = anim.start_rotation.slerp(anim.end_rotation, progress);
        let mut position = anim.start_position.lerp(anim.end_position, progress);
        position.y = anim.start_position.y;

        cube.pose = WorldPose { position, rotation };
        if anim.drives_body {
            if let Some(body) = &cube.body {
                physics.write_transform(body, position, rotation);
            }
        }

        if raw_progress < 1.0 {
            return false;
        }

        // Snap to the exact end pose so no interpolation error survives.
        cube.pose = WorldPose {
            position: anim.end_position,
            rotation: anim.end_rotation,
        };
        if anim.drives_body {
            if let Some(body) = &cube.body {
                physics.write_transform(body, anim.end_position, anim.end_rotation);
                physics.set_body_dynamic(body);
            }
        }

        self.animation = None;
        self.moving = false;
        true
    }
}
