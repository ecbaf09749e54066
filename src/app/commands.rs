//! Inbound commands to the control loop.
//!
//! These represent actions requested by the outside world (a button,
//! a host tool, the replay driver) that the
//! [`ControlLoop`](super::service::ControlLoop) interprets.

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    /// Zero every PID's integral and derivative state.
    ResetControllers,

    /// Drop any partially received frame (e.g. after the serial port
    /// was reopened).
    ResetFramer,
}
