use glam::Vec3;
use log::{debug, warn};

use crate::api::types::{GameError, GridCell};
use crate::core::physics::{BodyHandle, PhysicsFacade};
use crate::core::rng::Rng;

/// Height of an obstacle cube's center above the ground plane.
const OBSTACLE_REST_Y: f32 = 0.5;

/// Collider half extent of an obstacle cube.
const OBSTACLE_HALF_EXTENT: f32 = 0.5;

/// A static blocker: a fixed grid cell plus an optional physics body
/// (absent under the fallback facade). Immutable once placed.
#[derive(Debug)]
pub struct Obstacle {
    pub cell: GridCell,
    pub body: Option<BodyHandle>,
}

/// The set of occupied grid cells. Flat storage with linear scans —
/// obstacle counts are tiny. The registry owns placement; everything else
/// only queries it.
#[derive(Debug, Default)]
pub struct ObstacleRegistry {
    obstacles: Vec<Obstacle>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self {
            obstacles: Vec::new(),
        }
    }

    /// Whether `cell` is free of obstacles. Win-target and initial-cell
    /// exemptions are the move controller's concern, not checked here.
    pub fn is_free(&self, cell: GridCell) -> bool {
        !self.obstacles.iter().any(|o| o.cell == cell)
    }

    /// Place an obstacle at `cell`, creating a fixed physics body when the
    /// facade is real. Refuses occupied cells; that refusal is the only
    /// mechanism keeping obstacles off each other.
    pub fn place(&mut self, cell: GridCell, physics: &mut PhysicsFacade) -> Result<(), GameError> {
        if !self.is_free(cell) {
            warn!("cell ({}, {}) is occupied, obstacle not placed", cell.x, cell.z);
            return Err(GameError::CellOccupied(cell));
        }

        let position = Vec3::new(cell.x as f32, OBSTACLE_REST_Y, cell.z as f32);
        let body = physics.create_static_body(position, Vec3::splat(OBSTACLE_HALF_EXTENT));

        debug!("obstacle placed at ({}, {})", cell.x, cell.z);
        self.obstacles.push(Obstacle { cell, body });
        Ok(())
    }

    /// Place an obstacle on a uniformly sampled free cell within
    /// `[-bound, bound]` on each axis. Best-effort: gives up after
    /// `max_attempts` samples and returns `None` without failing the caller.
    pub fn place_random(
        &mut self,
        bound: i32,
        max_attempts: u32,
        rng: &mut Rng,
        physics: &mut PhysicsFacade,
    ) -> Option<GridCell> {
        for _ in 0..max_attempts {
            let cell = GridCell::new(
                rng.next_in_range(-bound, bound),
                rng.next_in_range(-bound, bound),
            );
            if self.is_free(cell) {
                // Cannot fail: we just checked the cell.
                self.place(cell, physics).ok()?;
                return Some(cell);
            }
        }
        warn!("no free cell found for a random obstacle after {max_attempts} attempts");
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}
