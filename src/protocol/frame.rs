//! Setpoint frame layouts and codec.
//!
//! Wire format (all values big-endian `i16`):
//! ```text
//! Tracking  (12 B):
//! ┌────────┬────────┬───────┬───────┬────────┬───────┬─────┬─────┐
//! │ meas_x │ meas_y │ set_x │ set_y │ status │ check │ S1  │ S2  │
//! │  2 B   │  2 B   │  2 B  │  2 B  │  1 B   │  1 B  │ 1 B │ 1 B │
//! └────────┴────────┴───────┴───────┴────────┴───────┴─────┴─────┘
//!
//! Setpoints (10 B):
//! ┌───────┬───────┬───────┬────────┬───────┬─────┬─────┐
//! │ set_x │ set_y │ set_z │ status │ check │ S1  │ S2  │
//! └───────┴───────┴───────┴────────┴───────┴─────┴─────┘
//! ```
//!
//! The check byte is the XOR of every payload byte (values and status)
//! and can be disabled, in which case the suffix directly follows the
//! status byte.  `S1`/`S2` are the configured suffix bytes.

use serde::{Deserialize, Serialize};

use crate::axes::{Axes, Axis};

/// Number of suffix bytes terminating every frame.
pub const SUFFIX_LEN: usize = 2;

/// Longest frame any layout can produce.
pub const MAX_FRAME_LEN: usize = 12;

/// Which values a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameLayout {
    /// Measured ball position and setpoint for X and Y, as sent by the
    /// camera tracking application.
    Tracking,
    /// Setpoints for X, Y and Z, no measurements.
    Setpoints,
}

impl FrameLayout {
    /// Number of `i16` values in the payload.
    pub const fn value_count(self) -> usize {
        match self {
            FrameLayout::Tracking => 4,
            FrameLayout::Setpoints => 3,
        }
    }

    pub const fn carries_setpoint(self, axis: Axis) -> bool {
        match self {
            FrameLayout::Tracking => !matches!(axis, Axis::Z),
            FrameLayout::Setpoints => true,
        }
    }

    pub const fn carries_measurement(self, axis: Axis) -> bool {
        match self {
            FrameLayout::Tracking => !matches!(axis, Axis::Z),
            FrameLayout::Setpoints => false,
        }
    }
}

/// Link framing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub layout: FrameLayout,
    /// Two bytes terminating every frame.
    pub suffix: [u8; SUFFIX_LEN],
    /// Whether an XOR check byte precedes the suffix.
    pub check_byte: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            layout: FrameLayout::Tracking,
            suffix: [0xEE, 0xEF],
            check_byte: true,
        }
    }
}

impl FrameConfig {
    /// Values plus the status byte.
    pub const fn payload_len(&self) -> usize {
        self.layout.value_count() * 2 + 1
    }

    /// Total bytes on the wire for one frame.
    pub const fn frame_len(&self) -> usize {
        self.payload_len() + self.check_byte as usize + SUFFIX_LEN
    }
}

/// A decoded setpoint update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetpointFrame {
    /// Requested position per axis; `None` where the layout has no value.
    pub setpoint: Axes<Option<i16>>,
    /// Measured position per axis; `None` where the layout has no value.
    pub measured: Axes<Option<i16>>,
    /// Sender's status byte, passed through uninterpreted.
    pub status: u8,
}

impl SetpointFrame {
    /// A frame in the [`FrameLayout::Setpoints`] shape.
    pub const fn setpoints(x: i16, y: i16, z: i16, status: u8) -> Self {
        Self {
            setpoint: Axes::new(Some(x), Some(y), Some(z)),
            measured: Axes::new(None, None, None),
            status,
        }
    }

    /// A frame in the [`FrameLayout::Tracking`] shape.
    pub const fn tracking(measured_x: i16, measured_y: i16, set_x: i16, set_y: i16, status: u8) -> Self {
        Self {
            setpoint: Axes::new(Some(set_x), Some(set_y), None),
            measured: Axes::new(Some(measured_x), Some(measured_y), None),
            status,
        }
    }
}

/// XOR of all bytes.
pub fn check_byte(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Interpret a payload (values + status, no check byte or suffix).
///
/// `payload` must be exactly `layout.value_count() * 2 + 1` bytes.
pub(crate) fn decode_payload(layout: FrameLayout, payload: &[u8]) -> SetpointFrame {
    let value = |i: usize| i16::from_be_bytes([payload[2 * i], payload[2 * i + 1]]);
    let status = payload[layout.value_count() * 2];

    match layout {
        FrameLayout::Tracking => SetpointFrame::tracking(value(0), value(1), value(2), value(3), status),
        FrameLayout::Setpoints => SetpointFrame::setpoints(value(0), value(1), value(2), status),
    }
}

/// Encode `frame` in the configured layout into `out`.
///
/// Values the frame does not carry are sent as zero.
/// Returns the number of bytes written, or `None` if `out` is too short.
pub fn encode_frame(frame: &SetpointFrame, config: &FrameConfig, out: &mut [u8]) -> Option<usize> {
    let total = config.frame_len();
    if out.len() < total {
        return None;
    }

    let values = match config.layout {
        FrameLayout::Tracking => [
            frame.measured.x,
            frame.measured.y,
            frame.setpoint.x,
            frame.setpoint.y,
        ],
        FrameLayout::Setpoints => [frame.setpoint.x, frame.setpoint.y, frame.setpoint.z, None],
    };

    let mut pos = 0;
    for v in values.iter().take(config.layout.value_count()) {
        out[pos..pos + 2].copy_from_slice(&v.unwrap_or(0).to_be_bytes());
        pos += 2;
    }
    out[pos] = frame.status;
    pos += 1;

    if config.check_byte {
        out[pos] = check_byte(&out[..pos]);
        pos += 1;
    }

    out[pos..pos + SUFFIX_LEN].copy_from_slice(&config.suffix);
    Some(total)
}
