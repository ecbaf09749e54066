//! Outbound control-loop events and state snapshots.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits events through
//! the [`EventSink`](super::ports::EventSink) port; adapters on the
//! other side decide what to do with them.

use crate::axes::Axes;
use crate::control::kinematics::ServoCommand;
use crate::protocol::framer::FramerStats;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopEvent {
    /// The loop has started.
    Started {
        tick_period_us: u32,
        watchdog_timeout_cycles: u32,
    },

    /// No valid frame for longer than the watchdog timeout; the loop is
    /// now steering to the fallback setpoint.
    LinkLost { cycles: u32 },

    /// A valid frame arrived after the link was lost.
    LinkRestored,

    /// PID state was zeroed on request.
    ControllersReset,
}

/// A point-in-time view of the loop, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSnapshot {
    pub tick_count: u64,
    pub link_lost: bool,
    pub cycles_since_frame: u32,
    /// Setpoint used on the last tick.
    pub setpoint: Axes<i16>,
    /// PID outputs from the last tick.
    pub corrections: Axes<f32>,
    pub command: ServoCommand,
    /// Status byte of the most recent valid frame.
    pub last_status: Option<u8>,
    pub framer: FramerStats,
}
