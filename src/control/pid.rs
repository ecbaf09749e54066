//! PID controller for one table axis.
//!
//! Three instances run side by side (X, Y, Z), each with its own gains
//! and state.  Time is measured in control cycles: `dt` is 1.0 when a
//! tick lands exactly on the nominal period, so the gains keep their
//! per-cycle meaning however fast the loop is clocked.

use serde::{Deserialize, Serialize};

/// Gain set for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Exponential smoothing applied to the error before
    /// differentiation, in `[0, 1)`.  0 disables the filter.
    pub derivative_filter: f32,
    /// Symmetric output clamp (±).
    pub output_limit: f32,
}

/// Everything the controller carries from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisPidState {
    pub setpoint: f32,
    pub input: f32,
    pub integral: f32,
    /// Filtered error from the previous tick.
    pub filtered_error: f32,
    pub output: f32,
}

/// PID controller
pub struct AxisPid {
    gains: PidGains,
    state: AxisPidState,
}

impl AxisPid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            state: AxisPidState::default(),
        }
    }

    /// Compute the corrective output for one tick.
    pub fn update(&mut self, setpoint: f32, input: f32, dt: f32) -> f32 {
        let g = &self.gains;
        let s = &mut self.state;
        let error = setpoint - input;

        // Integral, clamped so ki * integral stays inside the output range
        if g.ki != 0.0 {
            let limit = g.output_limit / g.ki.abs();
            s.integral = (s.integral + error * dt).clamp(-limit, limit);
        }

        // Derivative of the smoothed error
        // A zero-length step leaves the filter untouched so the change
        // is differentiated on the next real step.
        let (filtered, derivative) = if dt > 0.0 {
            let f = s.filtered_error * g.derivative_filter + error * (1.0 - g.derivative_filter);
            (f, (f - s.filtered_error) / dt)
        } else {
            (s.filtered_error, 0.0)
        };

        let raw = g.kp * error + g.ki * s.integral + g.kd * derivative;
        let output = if raw.is_nan() {
            0.0
        } else {
            raw.clamp(-g.output_limit, g.output_limit)
        };

        s.setpoint = setpoint;
        s.input = input;
        s.filtered_error = filtered;
        s.output = output;
        output
    }

    /// Zero the accumulated state.
    pub fn reset(&mut self) {
        self.state = AxisPidState::default();
    }

    pub fn state(&self) -> &AxisPidState {
        &self.state
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Last computed output.
    pub fn output(&self) -> f32 {
        self.state.output
    }
}
