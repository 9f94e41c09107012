use glam::Vec3;

use crate::api::types::{GridCell, WorldPose};
use crate::core::grid;
use crate::core::physics::BodyHandle;

/// Resting height of the cube's center: half the unit cube above the ground.
pub const REST_HEIGHT: f32 = 0.5;

/// Half extent of the unit cube.
pub const HALF_EXTENT: f32 = 0.5;

/// The single movable piece. Its `pose` is what gets rendered and is the
/// source of truth; the optional physics body shadows it while a roll is
/// driven and drives it back the rest of the time.
#[derive(Debug)]
pub struct CubeEntity {
    pub pose: WorldPose,
    pub body: Option<BodyHandle>,
}

impl CubeEntity {
    /// Create the cube at rest on the given cell.
    pub fn new(cell: GridCell) -> Self {
        Self {
            pose: WorldPose::from_position(Vec3::new(
                cell.x as f32,
                REST_HEIGHT,
                cell.z as f32,
            )),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Option<BodyHandle>) -> Self {
        self.body = body;
        self
    }

    /// The grid cell the cube currently occupies, derived from its pose.
    pub fn cell(&self) -> GridCell {
        grid::world_to_cell(self.pose.position)
    }
}
