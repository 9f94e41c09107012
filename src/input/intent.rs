// input/intent.rs
//
// Engine-side half of the move-intent surface. Keyboard/joystick wiring
// lives outside the crate; this tracks the currently held direction, applies
// the per-direction repeat cooldown, and re-issues the held direction when a
// roll completes (one-behind pipelining, like holding a joystick).

use crate::api::types::Direction;

/// Seconds a direction control must rest before it can fire again.
/// Applies to discrete presses only; pipelined re-issues bypass it.
pub const REPEAT_COOLDOWN: f32 = 0.2;

#[derive(Debug, Default)]
pub struct MoveIntentSource {
    held: Option<Direction>,
    cooldown_until: [f32; 4],
}

impl MoveIntentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A direction control went down at `now` seconds of game time.
    /// Returns the direction to dispatch, or `None` while that direction is
    /// still cooling down. Mutual exclusion with an in-flight roll is the
    /// move controller's job, not handled here.
    pub fn press(&mut self, direction: Direction, now: f32) -> Option<Direction> {
        self.held = Some(direction);
        if now < self.cooldown_until[direction.index()] {
            return None;
        }
        self.cooldown_until[direction.index()] = now + REPEAT_COOLDOWN;
        Some(direction)
    }

    /// All direction controls went up.
    pub fn release(&mut self) {
        self.held = None;
    }

    pub fn held(&self) -> Option<Direction> {
        self.held
    }

    /// The in-flight roll finished; if a direction is still held, it is
    /// re-issued immediately.
    pub fn move_completed(&self) -> Option<Direction> {
        self.held
    }
}
