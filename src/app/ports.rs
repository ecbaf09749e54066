//! Port traits — the hexagonal boundary between the control core and
//! the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (UART queue, position sensors, servo PWM, event
//! sinks, clocks) implement these traits.  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them through
//! generics, so the core never touches a peripheral directly.

use crate::axes::Axis;
use crate::control::kinematics::ServoCommand;

// ───────────────────────────────────────────────────────────────
// Byte source (driven adapter: serial link → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking source of received serial bytes.
pub trait ByteSource {
    /// Next buffered byte, or `None` if nothing is pending.
    fn read_byte(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Position feedback for axes configured with
/// [`MeasurementSource::Sensor`](crate::config::MeasurementSource::Sensor).
pub trait SensorPort {
    /// Current position on `axis` in logical units, or `None` if no
    /// reading is available this tick.
    fn read_position(&mut self, axis: Axis) -> Option<i16>;
}

// ───────────────────────────────────────────────────────────────
// Servo port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the loop emits one command per tick.
pub trait ServoPort {
    /// Drive the three servos to the given pulse widths.
    fn write_pulses(&mut self, command: &ServoCommand);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits [`LoopEvent`](super::events::LoopEvent)s through this
/// port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LoopEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock used to measure each tick's real length.
pub trait Clock {
    fn now_us(&self) -> u64;
}

/// [`SensorPort`] for rigs with no position sensors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensors;

impl SensorPort for NoSensors {
    fn read_position(&mut self, _axis: Axis) -> Option<i16> {
        None
    }
}
