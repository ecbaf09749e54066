//! Controller configuration.
//!
//! Everything the control loop needs to know about the rig: link
//! framing, watchdog timeout, per-axis gains and measurement sources,
//! fallback setpoint and servo geometry.  The configuration is loaded
//! once at startup (defaults, JSON, or a postcard blob from flash),
//! validated, and never changed while the loop runs.

use serde::{Deserialize, Serialize};

use crate::axes::{Axes, Axis};
use crate::control::kinematics::KinematicsConfig;
use crate::control::pid::PidGains;
use crate::error::{ConfigError, Result};
use crate::protocol::frame::FrameConfig;
use crate::safety::MAX_TIMEOUT_CYCLES;

/// Where an axis's measured input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementSource {
    /// Measured position carried in the setpoint frame.
    Frame,
    /// Read through [`SensorPort`](crate::app::ports::SensorPort).
    Sensor,
    /// A constant reference value.
    Fixed(i16),
    /// No feedback: the previous tick's setpoint stands in for the
    /// measurement.
    Commanded,
}

/// Gains and feedback source for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub gains: PidGains,
    pub measurement: MeasurementSource,
}

/// Serial link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub frame: FrameConfig,
    /// Cycles without a valid frame before the link counts as lost.
    pub watchdog_timeout_cycles: u32,
}

/// Complete controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub link: LinkConfig,
    /// Nominal control period (µs).
    pub tick_period_us: u32,
    pub axes: Axes<AxisConfig>,
    /// Target used while the link is lost.
    pub fallback_setpoint: Axes<i16>,
    pub kinematics: KinematicsConfig,
}

/// Tuned X/Y gains for the stock table.
pub const XY_GAINS: PidGains = PidGains {
    kp: 0.32,
    ki: 0.0012,
    kd: 46.0,
    derivative_filter: 0.9,
    output_limit: 500.0,
};

/// Z passes the height request straight through.
pub const Z_GAINS: PidGains = PidGains {
    kp: 1.0,
    ki: 0.0,
    kd: 0.0,
    derivative_filter: 0.0,
    output_limit: 500.0,
};

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig {
                baud_rate: 57_600,
                frame: FrameConfig::default(),
                // 125 cycles × 4 ms = 500 ms
                watchdog_timeout_cycles: 125,
            },
            tick_period_us: 4_000,
            axes: Axes {
                x: AxisConfig {
                    gains: XY_GAINS,
                    measurement: MeasurementSource::Frame,
                },
                y: AxisConfig {
                    gains: XY_GAINS,
                    measurement: MeasurementSource::Frame,
                },
                z: AxisConfig {
                    gains: Z_GAINS,
                    measurement: MeasurementSource::Fixed(1500),
                },
            },
            fallback_setpoint: Axes::splat(1500),
            kinematics: KinematicsConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Check every field.  Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.link.baud_rate == 0 {
            return Err(ConfigError::Invalid("link.baud_rate must be > 0"));
        }
        if self.link.frame.suffix[0] == self.link.frame.suffix[1] {
            return Err(ConfigError::Invalid("link.frame.suffix bytes must differ"));
        }
        if !(1..=MAX_TIMEOUT_CYCLES).contains(&self.link.watchdog_timeout_cycles) {
            return Err(ConfigError::Invalid(
                "link.watchdog_timeout_cycles must be in 1..=u32::MAX - 1",
            ));
        }
        if self.tick_period_us == 0 {
            return Err(ConfigError::Invalid("tick_period_us must be > 0"));
        }

        for axis in Axis::ALL {
            let cfg = self.axes.get(axis);
            validate_gains(&cfg.gains)?;
            if cfg.measurement == MeasurementSource::Frame
                && !self.link.frame.layout.carries_measurement(axis)
            {
                return Err(ConfigError::MeasurementNotInFrame(axis.name()));
            }
        }

        let k = &self.kinematics;
        if k.logical_max <= k.logical_min {
            return Err(ConfigError::Invalid("kinematics.logical_max must exceed logical_min"));
        }
        if k.mixing.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid("kinematics.mixing must be finite"));
        }
        if k.channels.iter().any(|c| c.lowest_us == c.highest_us) {
            return Err(ConfigError::Invalid("kinematics channel lowest_us and highest_us must differ"));
        }
        let in_range = |v: i16| (k.logical_min..=k.logical_max).contains(&v);
        if !self.fallback_setpoint.to_array().into_iter().all(in_range) {
            return Err(ConfigError::Invalid("fallback_setpoint must lie in the logical range"));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode into a flash blob.  Returns the number of bytes written.
    pub fn to_blob(&self, buf: &mut [u8]) -> Result<usize> {
        match postcard::to_slice(self, buf) {
            Ok(used) => Ok(used.len()),
            Err(postcard::Error::SerializeBufferFull) => Err(ConfigError::BufferTooSmall),
            Err(_) => Err(ConfigError::Malformed),
        }
    }

    /// Decode and validate a flash blob.
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Nominal control period in seconds.
    pub fn tick_secs(&self) -> f32 {
        self.tick_period_us as f32 / 1_000_000.0
    }
}

fn validate_gains(g: &PidGains) -> Result<()> {
    if ![g.kp, g.ki, g.kd].iter().all(|v| v.is_finite()) {
        return Err(ConfigError::Invalid("PID gains must be finite"));
    }
    if !(0.0..1.0).contains(&g.derivative_filter) {
        return Err(ConfigError::Invalid("derivative_filter must be in [0, 1)"));
    }
    if !(g.output_limit.is_finite() && g.output_limit > 0.0) {
        return Err(ConfigError::Invalid("output_limit must be finite and > 0"));
    }
    Ok(())
}
