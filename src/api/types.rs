use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A cell on the play grid, identified by integer x/z coordinates.
/// Derived from world space by rounding; the Y axis never participates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl From<(i32, i32)> for GridCell {
    fn from((x, z): (i32, i32)) -> Self {
        Self { x, z }
    }
}

/// The four discrete move directions a cube can roll in.
/// Up/Down run along the Z axis, Left/Right along the X axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// World-space displacement of one move in this direction.
    pub fn step(self, grid_size: f32) -> Vec3 {
        match self {
            Direction::Up => Vec3::new(0.0, 0.0, -grid_size),
            Direction::Down => Vec3::new(0.0, 0.0, grid_size),
            Direction::Left => Vec3::new(-grid_size, 0.0, 0.0),
            Direction::Right => Vec3::new(grid_size, 0.0, 0.0),
        }
    }

    /// Index used for per-direction bookkeeping (input cooldowns).
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// A rigid placement: position plus unit-quaternion orientation.
/// The rendered cube's pose is the single source of truth; physics bodies
/// mirror it while a roll is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl WorldPose {
    pub const IDENTITY: WorldPose = WorldPose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for WorldPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Events the game surfaces to whatever embeds it.
/// Drained per frame via `CubeGame::drain_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A roll ran to completion and the controller is Idle again.
    /// The sole signal that re-enables queued move intents.
    MoveCompleted,
    /// The cube came to rest on the win-target cell.
    GameWon,
}

/// Errors from administrative operations. Rejected moves are not errors;
/// `request_move` reports them as a plain `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("cell ({}, {}) is already occupied by an obstacle", .0.x, .0.z)]
    CellOccupied(GridCell),
    #[error("a roll animation is in progress")]
    RollInProgress,
}
