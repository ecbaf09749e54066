//! Link watchdog.
//!
//! The table's only failsafe.  The control loop advances the watchdog
//! by the number of nominal cycles that elapsed each tick and feeds it
//! whenever a valid frame arrives.  Once more than `timeout_cycles`
//! cycles pass without a frame the watchdog trips, and the loop steers
//! to the fallback setpoint until the next valid frame.
//!
//! ## Lifecycle
//!
//! 1. Boot: no frame has ever arrived, so the link counts as lost.
//! 2. First valid frame: counter zeroed, trip cleared.
//! 3. Each cycle without a frame: counter += 1 (saturating).
//! 4. Counter > timeout: tripped.
//! 5. Next valid frame: back to 2, within the same tick.

use log::{info, warn};

/// A change in link state reported by [`LinkWatchdog::advance`] or
/// [`LinkWatchdog::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Lost,
    Restored,
}

/// Longest usable timeout.  The counter saturates at `u32::MAX`, so it
/// must always be able to exceed the timeout.
pub const MAX_TIMEOUT_CYCLES: u32 = u32::MAX - 1;

/// Cycle-counting communication watchdog.
pub struct LinkWatchdog {
    timeout_cycles: u32,
    /// Cycles since the last valid frame.
    cycles: u32,
    tripped: bool,
}

impl LinkWatchdog {
    /// Create a watchdog that starts tripped, as if the link had been
    /// silent forever.  `timeout_cycles` is capped at
    /// [`MAX_TIMEOUT_CYCLES`].
    pub fn new(timeout_cycles: u32) -> Self {
        let timeout_cycles = timeout_cycles.min(MAX_TIMEOUT_CYCLES);
        Self {
            timeout_cycles,
            cycles: timeout_cycles.saturating_add(1),
            tripped: true,
        }
    }

    /// Record a valid frame.
    pub fn feed(&mut self) -> Option<LinkTransition> {
        self.cycles = 0;
        if self.tripped {
            self.tripped = false;
            info!("Link: restored");
            return Some(LinkTransition::Restored);
        }
        None
    }

    /// Count `cycles` elapsed cycles without a frame.
    pub fn advance(&mut self, cycles: u32) -> Option<LinkTransition> {
        self.cycles = self.cycles.saturating_add(cycles);
        if !self.tripped && self.cycles > self.timeout_cycles {
            self.tripped = true;
            warn!(
                "Link: lost ({} cycles without a valid frame, timeout {})",
                self.cycles, self.timeout_cycles
            );
            return Some(LinkTransition::Lost);
        }
        None
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Cycles since the last valid frame.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn timeout_cycles(&self) -> u32 {
        self.timeout_cycles
    }
}
