pub mod grid;
pub mod obstacles;
pub mod physics;
pub mod rng;
