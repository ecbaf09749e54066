//! Serial setpoint protocol.
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │ RX queue │──▶│ SerialFramer │──▶│ ControlLoop  │
//! │ (bytes)  │   │ (resync)     │   │ (setpoints)  │
//! └──────────┘   └──────────────┘   └──────────────┘
//! ```

pub mod frame;
pub mod framer;

pub use frame::{FrameConfig, FrameLayout, SetpointFrame, encode_frame};
pub use framer::{FramerState, FramerStats, SerialFramer};
