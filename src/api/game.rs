use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::types::{Direction, GameError, GameEvent, GridCell, WorldPose};
use crate::components::cube::{CubeEntity, HALF_EXTENT, REST_HEIGHT};
use crate::core::obstacles::ObstacleRegistry;
use crate::core::physics::PhysicsFacade;
use crate::core::rng::Rng;
use crate::input::intent::MoveIntentSource;
use crate::systems::roll::RollMotionController;

/// Half extents of the ground slab collider.
const GROUND_HALF_EXTENTS: Vec3 = Vec3::new(5.0, 0.01, 5.0);

/// Attempt budget for each random obstacle placement.
const RANDOM_PLACE_ATTEMPTS: u32 = 10;

/// World-space tolerance of the win check, per axis.
const WIN_TOLERANCE: f32 = 0.2;

/// Game configuration. All fields have defaults, so partial JSON configs
/// deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Starting cell of the cube.
    pub initial_position: GridCell,
    /// World size of one cell.
    pub grid_size: f32,
    /// Roll animation length in seconds.
    pub animation_duration: f32,
    /// Offset of the grid relative to world origin.
    pub grid_offset: f32,
    /// The cell that wins the game when occupied. `None` disables winning.
    pub win_target: Option<GridCell>,
    /// Gravity of the physics world.
    pub gravity: Vec3,
    /// Friction of the cube's collider.
    pub cube_friction: f32,
    /// Fixed obstacle layout. Occupied cells are skipped with a warning.
    pub obstacles: Vec<GridCell>,
    /// How many extra obstacles to scatter at setup.
    pub random_obstacles: u32,
    /// Random obstacles land within `[-bound, bound]` on each axis.
    pub random_obstacle_bound: i32,
    /// Seed for the obstacle scatter; same seed, same layout.
    pub rng_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_position: GridCell::new(0, 0),
            grid_size: 1.0,
            animation_duration: 0.3,
            grid_offset: 0.5,
            win_target: Some(GridCell::new(3, 3)),
            gravity: Vec3::new(0.0, -9.81, 0.0),
            cube_friction: 0.1,
            obstacles: vec![GridCell::new(2, -2)],
            random_obstacles: 0,
            random_obstacle_bound: 4,
            rng_seed: 42,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The game handle: owns the physics facade, the cube, the obstacle set and
/// the roll controller, and drives them from a caller-supplied frame loop.
///
/// Whatever embeds the game calls `tick(dt)` once per frame, feeds input
/// through `press`/`release` (or `request_move` directly) and drains
/// `GameEvent`s afterwards. No globals, no scheduler, no event bus.
pub struct CubeGame {
    settings: Settings,
    physics: PhysicsFacade,
    cube: CubeEntity,
    obstacles: ObstacleRegistry,
    roll: RollMotionController,
    intent: MoveIntentSource,
    rng: Rng,
    /// Accumulated game time, feeds the input repeat cooldown.
    elapsed: f32,
    game_won: bool,
    events: Vec<GameEvent>,
}

impl CubeGame {
    /// Build a game with a simulation-backed facade (or the inert fallback
    /// when the `physics` feature is compiled out).
    pub fn new(settings: Settings) -> Self {
        let physics = PhysicsFacade::new(settings.gravity);
        Self::with_facade(settings, physics)
    }

    /// Build a game on an explicitly chosen facade. The facade is selected
    /// here, once; nothing downstream ever asks which variant it got.
    pub fn with_facade(settings: Settings, mut physics: PhysicsFacade) -> Self {
        physics.create_static_body(
            Vec3::new(settings.grid_offset, 0.0, settings.grid_offset),
            GROUND_HALF_EXTENTS,
        );

        let start = Vec3::new(
            settings.initial_position.x as f32,
            REST_HEIGHT,
            settings.initial_position.z as f32,
        );
        let body = physics.create_dynamic_body(start, HALF_EXTENT, settings.cube_friction);
        let cube = CubeEntity::new(settings.initial_position).with_body(body);

        let mut obstacles = ObstacleRegistry::new();
        for &cell in &settings.obstacles {
            if let Err(err) = obstacles.place(cell, &mut physics) {
                warn!("skipping configured obstacle: {err}");
            }
        }
        let mut rng = Rng::new(settings.rng_seed);
        for _ in 0..settings.random_obstacles {
            obstacles.place_random(
                settings.random_obstacle_bound,
                RANDOM_PLACE_ATTEMPTS,
                &mut rng,
                &mut physics,
            );
        }

        let roll = RollMotionController::new(
            settings.animation_duration,
            settings.grid_size,
            settings.grid_offset,
            settings.initial_position,
            settings.win_target,
        );

        info!(
            "game initialized: cube at ({}, {}), {} obstacle(s), fallback={}",
            settings.initial_position.x,
            settings.initial_position.z,
            obstacles.len(),
            physics.is_fallback()
        );

        Self {
            settings,
            physics,
            cube,
            obstacles,
            roll,
            intent: MoveIntentSource::new(),
            rng,
            elapsed: 0.0,
            game_won: false,
            events: Vec::new(),
        }
    }

    /// Advance the game by one frame of `dt` seconds.
    ///
    /// While a roll is animating the physics advance is skipped entirely —
    /// the animation owns the body's transform for that window. Otherwise:
    /// advance the simulation, sync the cube's pose from its body (or apply
    /// the visual settle rule when no body is bound), then check the win
    /// condition. Rendering happens after this call, outside the crate.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;

        if self.roll.is_animating() {
            if self.roll.tick(dt, &mut self.cube, &mut self.physics) {
                self.events.push(GameEvent::MoveCompleted);
                if let Some(direction) = self.intent.move_completed() {
                    self.roll.request_move(
                        direction,
                        &mut self.cube,
                        &self.obstacles,
                        &mut self.physics,
                    );
                }
            }
            return;
        }

        self.physics.advance(dt);
        if let Some(body) = &self.cube.body {
            self.cube.pose = self.physics.read_transform(body);
        } else if self.cube.pose.position.y > REST_HEIGHT {
            // Visual-only settle under the fallback facade.
            self.cube.pose.position.y = REST_HEIGHT;
        }

        self.check_win();
    }

    /// Issue a discrete move intent. Returns whether the move was accepted;
    /// rejections are silent no-ops observable only by the absence of a
    /// later `MoveCompleted`.
    pub fn request_move(&mut self, direction: Direction) -> bool {
        self.roll
            .request_move(direction, &mut self.cube, &self.obstacles, &mut self.physics)
    }

    /// A direction control went down (keyboard or joystick, pre-mapped to
    /// the four directions). Debounced per direction; the direction is
    /// remembered and re-issued when the in-flight roll completes.
    pub fn press(&mut self, direction: Direction) -> bool {
        match self.intent.press(direction, self.elapsed) {
            Some(direction) => self.request_move(direction),
            None => false,
        }
    }

    /// All direction controls went up; stops the pipelined re-issue.
    pub fn release(&mut self) {
        self.intent.release();
    }

    /// Force the cube directly to `cell`, bypassing the roll state machine.
    /// Rejected while a roll is animating.
    pub fn set_position(&mut self, cell: GridCell) -> Result<(), GameError> {
        if self.roll.is_animating() {
            return Err(GameError::RollInProgress);
        }

        let position = Vec3::new(cell.x as f32, REST_HEIGHT, cell.z as f32);
        self.cube.pose = WorldPose::from_position(position);
        if let Some(body) = &self.cube.body {
            self.physics
                .write_transform(body, position, self.cube.pose.rotation);
            self.physics.set_velocity(body, Vec3::ZERO);
        }
        info!("cube moved to ({}, {})", cell.x, cell.z);
        Ok(())
    }

    /// Put the cube back on its initial cell and clear the win flag.
    pub fn reset_game(&mut self) -> Result<(), GameError> {
        self.set_position(self.settings.initial_position)?;
        self.game_won = false;
        info!("game reset");
        Ok(())
    }

    /// Scatter one more obstacle on a random free cell. Best-effort.
    pub fn add_random_obstacle(&mut self) -> Option<GridCell> {
        self.obstacles.place_random(
            self.settings.random_obstacle_bound,
            RANDOM_PLACE_ATTEMPTS,
            &mut self.rng,
            &mut self.physics,
        )
    }

    /// Take all events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_animating(&self) -> bool {
        self.roll.is_animating()
    }

    pub fn game_won(&self) -> bool {
        self.game_won
    }

    pub fn cube_cell(&self) -> GridCell {
        self.cube.cell()
    }

    pub fn cube_pose(&self) -> WorldPose {
        self.cube.pose
    }

    pub fn obstacle_cells(&self) -> Vec<GridCell> {
        self.obstacles.iter().map(|o| o.cell).collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // Gated on the controller being fully idle so a mid-animation pose can
    // never count as a win.
    fn check_win(&mut self) {
        if self.game_won || self.roll.is_moving() {
            return;
        }
        let Some(target) = self.settings.win_target else {
            return;
        };

        let pos = self.cube.pose.position;
        if (pos.x - target.x as f32).abs() < WIN_TOLERANCE
            && (pos.z - target.z as f32).abs() < WIN_TOLERANCE
        {
            self.game_won = true;
            self.events.push(GameEvent::GameWon);
            info!("cube reached the win target at ({}, {})", target.x, target.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inert_game(settings: Settings) -> CubeGame {
        CubeGame::with_facade(settings, PhysicsFacade::inert())
    }

    fn tick_until_idle(game: &mut CubeGame) {
        for _ in 0..120 {
            game.tick(1.0 / 60.0);
            if !game.is_animating() {
                break;
            }
        }
        assert!(!game.is_animating(), "roll never completed");
    }

    #[test]
    fn default_settings_mirror_the_classic_level() {
        let s = Settings::default();
        assert_eq!(s.initial_position, GridCell::new(0, 0));
        assert_eq!(s.win_target, Some(GridCell::new(3, 3)));
        assert_eq!(s.obstacles, vec![GridCell::new(2, -2)]);
        assert!((s.animation_duration - 0.3).abs() < 1e-6);
    }

    #[test]
    fn settings_from_partial_json() {
        let s = Settings::from_json(r#"{ "win_target": { "x": 1, "z": -1 }, "rng_seed": 7 }"#)
            .unwrap();
        assert_eq!(s.win_target, Some(GridCell::new(1, -1)));
        assert_eq!(s.rng_seed, 7);
        // Everything else falls back to defaults.
        assert_eq!(s.initial_position, GridCell::new(0, 0));
    }

    #[test]
    fn setup_places_configured_obstacles() {
        let game = inert_game(Settings::default());
        assert_eq!(game.obstacle_cells(), vec![GridCell::new(2, -2)]);
        assert_eq!(game.cube_cell(), GridCell::new(0, 0));
        assert!(!game.game_won());
    }

    #[test]
    fn duplicate_configured_obstacles_are_skipped_not_fatal() {
        let settings = Settings {
            obstacles: vec![GridCell::new(1, 1), GridCell::new(1, 1)],
            ..Settings::default()
        };
        let game = inert_game(settings);
        assert_eq!(game.obstacle_cells(), vec![GridCell::new(1, 1)]);
    }

    #[test]
    fn accepted_move_emits_one_completion_event() {
        let mut game = inert_game(Settings::default());
        assert!(game.request_move(Direction::Right));
        tick_until_idle(&mut game);

        let events = game.drain_events();
        let completions = events
            .iter()
            .filter(|e| **e == GameEvent::MoveCompleted)
            .count();
        assert_eq!(completions, 1);
        assert_eq!(game.cube_cell(), GridCell::new(1, 0));
    }

    #[test]
    fn set_position_is_rejected_mid_roll() {
        let mut game = inert_game(Settings::default());
        assert!(game.request_move(Direction::Up));
        assert_eq!(
            game.set_position(GridCell::new(3, 3)),
            Err(GameError::RollInProgress)
        );

        tick_until_idle(&mut game);
        assert!(game.set_position(GridCell::new(2, 2)).is_ok());
        assert_eq!(game.cube_cell(), GridCell::new(2, 2));
    }

    #[test]
    fn set_position_resets_orientation() {
        let mut game = inert_game(Settings::default());
        assert!(game.request_move(Direction::Right));
        tick_until_idle(&mut game);
        assert!(game.cube_pose().rotation.angle_between(glam::Quat::IDENTITY) > 0.1);

        game.set_position(GridCell::new(0, 0)).unwrap();
        assert_eq!(game.cube_pose().rotation, glam::Quat::IDENTITY);
    }

    #[test]
    fn reset_clears_the_win_flag() {
        let mut game = inert_game(Settings::default());
        game.set_position(GridCell::new(3, 3)).unwrap();
        game.tick(1.0 / 60.0);
        assert!(game.game_won());

        game.reset_game().unwrap();
        assert!(!game.game_won());
        assert_eq!(game.cube_cell(), GridCell::new(0, 0));
        assert!(game.drain_events().contains(&GameEvent::GameWon));
    }

    #[test]
    fn win_fires_once() {
        let mut game = inert_game(Settings::default());
        game.set_position(GridCell::new(3, 3)).unwrap();
        for _ in 0..10 {
            game.tick(1.0 / 60.0);
        }
        let wins = game
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::GameWon)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn fallback_settle_clamps_height_when_idle() {
        let mut game = inert_game(Settings::default());
        game.cube.pose.position.y = 2.0;
        game.tick(1.0 / 60.0);
        assert_eq!(game.cube_pose().position.y, REST_HEIGHT);
    }

    #[test]
    fn held_direction_pipelines_moves_without_new_presses() {
        let mut game = inert_game(Settings::default());
        assert!(game.press(Direction::Right));

        let mut completed = 0;
        for _ in 0..240 {
            game.tick(1.0 / 60.0);
            completed += game
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::MoveCompleted)
                .count();
            if completed == 2 {
                break;
            }
        }
        assert_eq!(completed, 2);
        // A third roll was pipelined the instant the second one finished.
        assert!(game.is_animating());

        game.release();
        tick_until_idle(&mut game);
        assert_eq!(game.cube_cell(), GridCell::new(3, 0));
    }

    #[test]
    fn release_stops_the_pipeline() {
        let mut game = inert_game(Settings::default());
        assert!(game.press(Direction::Down));
        game.release();
        tick_until_idle(&mut game);
        for _ in 0..30 {
            game.tick(1.0 / 60.0);
        }
        assert_eq!(game.cube_cell(), GridCell::new(0, 1));
    }

    #[test]
    fn press_is_debounced_per_direction() {
        // Animation shorter than the 0.2 s cooldown, so the cooldown is the
        // only thing rejecting the second press.
        let settings = Settings {
            animation_duration: 0.05,
            ..Settings::default()
        };
        let mut game = inert_game(settings);

        assert!(game.press(Direction::Right));
        game.release(); // no pipelining, just the raw cooldown
        game.tick(0.1);
        assert!(!game.is_animating());
        assert!(!game.press(Direction::Right));

        game.tick(0.15); // past the cooldown now
        assert!(game.press(Direction::Right));
    }

    #[test]
    fn random_obstacles_at_setup_are_seed_stable() {
        let settings = Settings {
            obstacles: Vec::new(),
            random_obstacles: 3,
            rng_seed: 1234,
            ..Settings::default()
        };
        let a = inert_game(settings.clone());
        let b = inert_game(settings);
        assert_eq!(a.obstacle_cells(), b.obstacle_cells());
        assert_eq!(a.obstacle_cells().len(), 3);
    }

    #[test]
    fn add_random_obstacle_avoids_existing_cells() {
        let mut game = inert_game(Settings::default());
        for _ in 0..20 {
            if let Some(cell) = game.add_random_obstacle() {
                let occurrences = game
                    .obstacle_cells()
                    .iter()
                    .filter(|c| **c == cell)
                    .count();
                assert_eq!(occurrences, 1);
            }
        }
    }

    #[cfg(feature = "physics")]
    mod with_rapier {
        use super::*;

        #[test]
        fn cube_settles_on_the_ground_between_moves() {
            let mut game = CubeGame::new(Settings::default());
            assert!(!game.settings().gravity.y.is_sign_positive());

            for _ in 0..120 {
                game.tick(1.0 / 60.0);
            }
            let y = game.cube_pose().position.y;
            assert!((y - REST_HEIGHT).abs() < 0.1, "cube at y={y}");
        }

        #[test]
        fn full_roll_round_trip_with_simulation() {
            let mut game = CubeGame::new(Settings::default());
            for _ in 0..30 {
                game.tick(1.0 / 60.0);
            }

            assert!(game.request_move(Direction::Right));
            for _ in 0..120 {
                game.tick(1.0 / 60.0);
            }
            assert_eq!(game.cube_cell(), GridCell::new(1, 0));
            assert!(game
                .drain_events()
                .contains(&GameEvent::MoveCompleted));
        }
    }
}
