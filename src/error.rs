//! Error types for the ball-table control core.
//!
//! The control path itself is infallible: bad frames are discarded,
//! out-of-range values are clamped and link loss is handled by the
//! watchdog.  The only fallible operation is accepting a configuration,
//! so every error here describes a configuration problem.  Variants are
//! `Copy` so they can be returned from validation without allocation.

use core::fmt;

/// Why a [`ControllerConfig`](crate::config::ControllerConfig) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric field failed range validation.
    /// The `&'static str` names the field and the rule.
    Invalid(&'static str),
    /// An axis reads its measurement from the frame, but the configured
    /// frame layout does not carry a measurement for that axis.
    MeasurementNotInFrame(&'static str),
    /// Text or binary input could not be decoded into a configuration.
    Malformed,
    /// The output buffer is too small for the encoded configuration.
    BufferTooSmall,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
            Self::MeasurementNotInFrame(axis) => {
                write!(f, "axis {axis} measures from frame, but layout carries no {axis} measurement")
            }
            Self::Malformed => write!(f, "malformed config"),
            Self::BufferTooSmall => write!(f, "buffer too small for config blob"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, ConfigError>;
