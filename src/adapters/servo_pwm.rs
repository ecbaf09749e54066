//! Servo PWM adapter.
//!
//! Implements [`ServoPort`] over three `embedded-hal` PWM channels, one
//! per actuator.  Pulse widths are converted to duty cycles against the
//! servo frame period (20 ms for standard hobby servos).

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ServoPort;
use crate::control::kinematics::{CHANNELS, ServoCommand};

/// 50 Hz servo frame.
pub const SERVO_PERIOD_US: u16 = 20_000;

/// Three PWM channels driven as one servo bank.
pub struct PwmServoBank<P: SetDutyCycle> {
    channels: [P; CHANNELS],
    period_us: u16,
    write_errors: u32,
}

impl<P: SetDutyCycle> PwmServoBank<P> {
    /// Bank with the standard 20 ms frame.  The timer behind `channels`
    /// must already be configured for that frequency.
    pub fn new(channels: [P; CHANNELS]) -> Self {
        Self::with_period(channels, SERVO_PERIOD_US)
    }

    pub fn with_period(channels: [P; CHANNELS], period_us: u16) -> Self {
        Self {
            channels,
            period_us: period_us.max(1),
            write_errors: 0,
        }
    }

    /// Failed channel writes since creation.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    pub fn channels(&self) -> &[P; CHANNELS] {
        &self.channels
    }

    /// Release the PWM channels.
    pub fn into_inner(self) -> [P; CHANNELS] {
        self.channels
    }
}

impl<P: SetDutyCycle> ServoPort for PwmServoBank<P> {
    fn write_pulses(&mut self, command: &ServoCommand) {
        for (ch, (pwm, &pulse)) in self.channels.iter_mut().zip(&command.pulses_us).enumerate() {
            let pulse = pulse.min(self.period_us);
            if let Err(e) = pwm.set_duty_cycle_fraction(pulse, self.period_us) {
                self.write_errors = self.write_errors.wrapping_add(1);
                warn!("Servo {}: PWM write failed: {:?}", ch, e);
            }
        }
    }
}
