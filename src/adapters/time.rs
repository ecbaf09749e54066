//! Monotonic clock adapter.
//!
//! Host builds use `std::time::Instant`; on target the board crate
//! supplies its own [`Clock`] over a hardware timer.

use std::time::Instant;

use crate::app::ports::Clock;

/// Microseconds since the adapter was created.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    /// Wraps at `u64::MAX`.
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
