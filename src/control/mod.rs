//! Feedback control: per-axis PID and the platform kinematics.

pub mod kinematics;
pub mod pid;

pub use kinematics::{ChannelCalibration, KinematicMapper, KinematicsConfig, ServoCommand};
pub use pid::{AxisPid, AxisPidState, PidGains};
