//! Ball-balancing table control core.
//!
//! Turns a stream of serial setpoint frames into three servo pulse
//! widths every control period.  The domain logic lives in [`app`],
//! [`control`], [`protocol`] and [`safety`] and never touches hardware;
//! [`adapters`] implement the port traits over `embedded-hal` and the
//! host standard library.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod axes;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod rx_queue;
pub mod safety;

pub use app::service::ControlLoop;
pub use config::ControllerConfig;
