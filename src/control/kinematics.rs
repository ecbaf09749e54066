//! Axis corrections → servo pulse widths.
//!
//! Three servos sit around the table at fixed angular offsets.  Tilting
//! about X or Y and lifting along Z are each a linear combination of
//! the three servo strokes, so the mapping is a fixed 3×3 mixing matrix
//! followed by a per-channel calibration from the logical command range
//! (1000..2000 by default) to the microsecond pulse each servo actually
//! needs.  A channel may be mounted mirrored, in which case its
//! `highest_us` is numerically smaller than its `lowest_us`.

use serde::{Deserialize, Serialize};

use crate::axes::Axes;

/// Number of servo channels.
pub const CHANNELS: usize = 3;

/// Pulse widths at the two ends of the logical command range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCalibration {
    /// Pulse (µs) at the logical minimum.
    pub lowest_us: u16,
    /// Pulse (µs) at the logical maximum.
    pub highest_us: u16,
}

impl ChannelCalibration {
    /// Numeric lower and upper pulse bound, whatever the orientation.
    pub fn bounds(&self) -> (u16, u16) {
        (self.lowest_us.min(self.highest_us), self.lowest_us.max(self.highest_us))
    }

    pub fn contains(&self, pulse_us: u16) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&pulse_us)
    }
}

/// Geometry and calibration of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicsConfig {
    /// Row per servo channel (P, Q, R); columns weight the X, Y and Z
    /// corrections.
    pub mixing: [[f32; 3]; CHANNELS],
    /// Logical command range shared by setpoints and servo scalars.
    pub logical_min: i16,
    pub logical_max: i16,
    pub channels: [ChannelCalibration; CHANNELS],
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            // P at the front (90°), Q and R at 330° and 210°.
            mixing: [
                [0.0, 1.0, 1.0],
                [0.866, -0.5, 1.0],
                [-0.866, -0.5, 1.0],
            ],
            logical_min: 1000,
            logical_max: 2000,
            channels: [
                ChannelCalibration { lowest_us: 2000, highest_us: 1450 },
                ChannelCalibration { lowest_us: 2000, highest_us: 1450 },
                ChannelCalibration { lowest_us: 2010, highest_us: 1450 },
            ],
        }
    }
}

impl KinematicsConfig {
    /// Midpoint of the logical range.
    pub fn neutral(&self) -> f32 {
        (f32::from(self.logical_min) + f32::from(self.logical_max)) / 2.0
    }
}

/// Pulse widths for the three servos, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServoCommand {
    pub pulses_us: [u16; CHANNELS],
}

/// Maps axis corrections onto servo pulses.
pub struct KinematicMapper {
    config: KinematicsConfig,
}

impl KinematicMapper {
    pub fn new(config: KinematicsConfig) -> Self {
        Self { config }
    }

    /// Map corrections to clamped pulse widths.
    pub fn map(&self, corrections: Axes<f32>) -> ServoCommand {
        let c = corrections.to_array();
        let neutral = self.config.neutral();
        let mut pulses_us = [0u16; CHANNELS];

        for (i, pulse) in pulses_us.iter_mut().enumerate() {
            let row = &self.config.mixing[i];
            let scalar = neutral + row[0] * c[0] + row[1] * c[1] + row[2] * c[2];
            let scalar = if scalar.is_nan() { neutral } else { scalar };
            *pulse = self.to_pulse(i, scalar);
        }

        ServoCommand { pulses_us }
    }

    /// Pulse every channel produces for zero correction.
    pub fn neutral_command(&self) -> ServoCommand {
        self.map(Axes::splat(0.0))
    }

    pub fn config(&self) -> &KinematicsConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────────

    fn to_pulse(&self, channel: usize, scalar: f32) -> u16 {
        let cal = &self.config.channels[channel];
        let min = f32::from(self.config.logical_min);
        let span = f32::from(self.config.logical_max) - min;
        let lowest = f32::from(cal.lowest_us);
        let highest = f32::from(cal.highest_us);

        let pulse = lowest + (scalar - min) / span * (highest - lowest);
        let pulse = if pulse.is_nan() { lowest } else { pulse };
        let (lo, hi) = cal.bounds();
        pulse.round().clamp(f32::from(lo), f32::from(hi)) as u16
    }
}
