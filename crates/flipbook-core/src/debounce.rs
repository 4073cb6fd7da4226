//! Generation-counted debouncing
//!
//! Timers themselves live in the host; each scheduled callback carries the
//! token it was issued with and only the newest token is allowed to fire.

#[derive(Debug, Default, Clone)]
pub struct Debounce {
    generation: u64,
}

impl Debounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, invalidating every earlier one
    pub fn schedule(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// True if `token` is still the newest
    pub fn is_current(&self, token: u64) -> bool {
        token == self.generation
    }

    /// Drop any pending callback
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
