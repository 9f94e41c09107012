//! Grid-locked rolling-cube puzzle engine.
//!
//! A unit cube occupies a cell on a bounded grid and is rolled one cell at a
//! time by discrete directional input: each accepted move is a 90° rotation
//! about the leading top edge synchronized with a linear slide, validated
//! against bounds and obstacles. A rapier3d rigid-body world (or an inert
//! fallback) keeps the cube physically plausible between rolls.
//!
//! The embedder owns the frame loop and rendering: construct a [`CubeGame`],
//! call [`CubeGame::tick`] every frame with the elapsed seconds, feed input
//! with [`CubeGame::press`]/[`CubeGame::release`], and drain
//! [`GameEvent`]s afterwards.

pub mod api;
pub mod components;
pub mod core;
pub mod extensions;
pub mod input;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::game::{CubeGame, Settings};
pub use api::types::{Direction, GameError, GameEvent, GridCell, WorldPose};
pub use components::cube::CubeEntity;
pub use core::obstacles::{Obstacle, ObstacleRegistry};
pub use core::physics::{BodyHandle, PhysicsFacade};
pub use core::rng::Rng;
pub use extensions::easing::{lerp, lerp_vec3, Easing};
pub use input::intent::MoveIntentSource;
pub use systems::roll::{RollAnimation, RollMotionController};

#[cfg(feature = "physics")]
pub use core::physics::RapierWorld;
