// core/grid.rs
//
// Pure grid geometry — cell mapping, bounds checks, pivot/axis math.
// No dependencies on entities or physics, just math.

use glam::Vec3;

use crate::api::types::{Direction, GridCell};

/// Half extent of the playfield measured from its center, before the grid
/// offset is applied. A 10x10 board of unit cells reaches ±4.5 cell centers.
pub const FIELD_HALF_EXTENT: f32 = 4.5;

/// Symmetric tolerance applied to the bounds check so cell centers that land
/// exactly on the boundary are not rejected by floating-point noise.
pub const BOUNDS_EPSILON: f32 = 0.01;

/// Map a world position to the grid cell it occupies (nearest cell center).
pub fn world_to_cell(position: Vec3) -> GridCell {
    GridCell {
        x: position.x.round() as i32,
        z: position.z.round() as i32,
    }
}

/// Whether `position` lies on the playfield. Both x and z must fall within
/// `[-4.5 + offset, 4.5 + offset]`, widened by `BOUNDS_EPSILON` on each side.
pub fn is_within_bounds(position: Vec3, grid_offset: f32) -> bool {
    let min = -FIELD_HALF_EXTENT + grid_offset - BOUNDS_EPSILON;
    let max = FIELD_HALF_EXTENT + grid_offset + BOUNDS_EPSILON;
    position.x >= min && position.x <= max && position.z >= min && position.z <= max
}

/// The world-space point a roll rotates about: the midpoint of the cube's
/// top edge on the side it is rolling toward.
pub fn pivot_for(direction: Direction, current: Vec3, half_extent: f32) -> Vec3 {
    match direction {
        Direction::Up => Vec3::new(
            current.x,
            current.y + half_extent,
            current.z - half_extent,
        ),
        Direction::Down => Vec3::new(
            current.x,
            current.y + half_extent,
            current.z + half_extent,
        ),
        Direction::Left => Vec3::new(
            current.x - half_extent,
            current.y + half_extent,
            current.z,
        ),
        Direction::Right => Vec3::new(
            current.x + half_extent,
            current.y + half_extent,
            current.z,
        ),
    }
}

/// The horizontal axis a +90° rotation about which rolls the top face
/// toward `direction`. Fixed table, one axis per direction.
pub fn rotation_axis_for(direction: Direction) -> Vec3 {
    match direction {
        Direction::Up => Vec3::new(-1.0, 0.0, 0.0),
        Direction::Down => Vec3::new(1.0, 0.0, 0.0),
        Direction::Left => Vec3::new(0.0, 0.0, 1.0),
        Direction::Right => Vec3::new(0.0, 0.0, -1.0),
    }
}
