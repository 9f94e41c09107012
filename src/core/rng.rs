//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic under a fixed seed, which keeps random obstacle layouts
//! reproducible in tests and replays.

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Random integer in `[min, max]` inclusive.
    pub fn next_in_range(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max);
        let span = (max - min + 1) as u64;
        min + (self.next_u64() % span) as i32
    }
}
