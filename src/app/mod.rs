//! Application core — pure domain logic, zero I/O.
//!
//! Each tick the [`service::ControlLoop`] drains received bytes, decodes
//! setpoint frames, supervises the link, runs the three axis
//! controllers and maps their output onto the servos.  All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
