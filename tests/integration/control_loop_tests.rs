//! Integration tests for the bytes → framer → PID → kinematics pipeline.

use balltable::app::commands::LoopCommand;
use balltable::app::events::LoopEvent;
use balltable::app::service::ControlLoop;
use balltable::axes::{Axes, Axis};
use balltable::config::{ControllerConfig, MeasurementSource};
use balltable::control::{KinematicMapper, ServoCommand};
use balltable::protocol::{FrameLayout, SetpointFrame};

use crate::mock_hw::{EventLog, MockLink, MockTable, PERIOD_US};

const NEUTRAL: ServoCommand = ServoCommand {
    pulses_us: [1725, 1725, 1730],
};

fn setpoint_config() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.link.frame.layout = FrameLayout::Setpoints;
    config.axes.x.measurement = MeasurementSource::Fixed(0);
    config.axes.y.measurement = MeasurementSource::Fixed(0);
    config.axes.z.measurement = MeasurementSource::Fixed(0);
    config
}

fn make_loop(config: ControllerConfig) -> (ControlLoop, MockLink, MockTable, EventLog) {
    let mut control = ControlLoop::new(config).expect("valid config");
    let mut events = EventLog::new();
    control.start(&mut events);
    (control, MockLink::new(), MockTable::new(), events)
}

#[test]
fn zero_frame_with_zero_measurement_gives_neutral_pulses() {
    let config = setpoint_config();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send(&SetpointFrame::setpoints(0, 0, 0, 0), &config);
    let cmd = control.tick(0, &mut link, &mut table, &mut events);

    assert_eq!(control.framer().stats().frames, 1);
    assert_eq!(control.watchdog().cycles(), 0);
    assert_eq!(control.snapshot().setpoint, Axes::splat(0));
    assert_eq!(control.snapshot().corrections, Axes::splat(0.0));
    assert_eq!(cmd, NEUTRAL);
    assert_eq!(table.last(), Some(&NEUTRAL));
}

#[test]
fn default_geometry_neutral_matches_calibration() {
    let config = ControllerConfig::default();
    assert_eq!(KinematicMapper::new(config.kinematics).neutral_command(), NEUTRAL);
}

#[test]
fn started_event_carries_timing() {
    let (_, _, _, events) = make_loop(ControllerConfig::default());
    assert_eq!(
        events.events,
        vec![LoopEvent::Started {
            tick_period_us: 4_000,
            watchdog_timeout_cycles: 125,
        }]
    );
}

#[test]
fn one_servo_write_per_tick() {
    let (mut control, mut link, mut table, mut events) = make_loop(ControllerConfig::default());
    for i in 0..20 {
        control.tick(i * PERIOD_US, &mut link, &mut table, &mut events);
    }
    assert_eq!(table.commands.len(), 20);
    assert_eq!(control.tick_count(), 20);
}

#[test]
fn ball_off_centre_tilts_table() {
    let config = ControllerConfig::default();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    // Ball measured at x=1400 while the target is 1500.
    link.send(&SetpointFrame::tracking(1400, 1500, 1500, 1500, 0), &config);
    let cmd = control.tick(0, &mut link, &mut table, &mut events);

    let snap = control.snapshot();
    assert!(snap.corrections.x > 0.0);
    assert_eq!(snap.corrections.y, 0.0);
    // P carries no X weight; Q and R move in opposite directions.
    assert_eq!(cmd.pulses_us[0], NEUTRAL.pulses_us[0]);
    assert!(cmd.pulses_us[1] < NEUTRAL.pulses_us[1]);
    assert!(cmd.pulses_us[2] > NEUTRAL.pulses_us[2]);
}

#[test]
fn pulses_stay_in_calibrated_bounds_under_large_error() {
    let config = ControllerConfig::default();
    let (mut control, mut link, mut table, mut events) = make_loop(config);
    for i in 0..50 {
        link.send(&SetpointFrame::tracking(-30_000, 30_000, 30_000, -30_000, 0), &config);
        let cmd = control.tick(i * PERIOD_US, &mut link, &mut table, &mut events);
        for (ch, pulse) in cmd.pulses_us.iter().enumerate() {
            assert!(config.kinematics.channels[ch].contains(*pulse), "ch{ch} = {pulse}");
        }
    }
}

#[test]
fn last_frame_in_a_burst_wins() {
    let config = setpoint_config();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send(&SetpointFrame::setpoints(1100, 1100, 1100, 1), &config);
    link.send(&SetpointFrame::setpoints(1200, 1300, 1400, 2), &config);
    control.tick(0, &mut link, &mut table, &mut events);

    assert_eq!(control.snapshot().setpoint, Axes::new(1200, 1300, 1400));
    assert_eq!(control.snapshot().last_status, Some(2));
    assert_eq!(control.framer().stats().frames, 2);
}

#[test]
fn noise_before_frame_is_skipped() {
    let config = ControllerConfig::default();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send_raw(&[0x13, 0xEE, 0x00, 0xEF, 0xEE, 0x42]);
    link.send(&SetpointFrame::tracking(1500, 1500, 1600, 1400, 0), &config);
    control.tick(0, &mut link, &mut table, &mut events);

    assert!(!control.is_link_lost());
    assert_eq!(control.snapshot().setpoint, Axes::new(1600, 1400, 1500));
    assert!(control.framer().stats().discarded_bytes >= 6);
}

#[test]
fn frame_split_across_ticks_is_reassembled() {
    let config = ControllerConfig::default();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    let mut whole = MockLink::new();
    whole.send(&SetpointFrame::tracking(1500, 1500, 1700, 1500, 0), &config);
    let bytes: Vec<u8> = whole.pending.drain(..).collect();

    link.send_raw(&bytes[..5]);
    control.tick(0, &mut link, &mut table, &mut events);
    assert!(control.is_link_lost());

    link.send_raw(&bytes[5..]);
    control.tick(PERIOD_US, &mut link, &mut table, &mut events);
    assert!(!control.is_link_lost());
    assert_eq!(control.snapshot().setpoint.x, 1700);
}

#[test]
fn sensor_axis_reads_sensor_port() {
    let mut config = setpoint_config();
    config.axes.y.measurement = MeasurementSource::Sensor;
    let (mut control, mut link, mut table, mut events) = make_loop(config);
    table.positions.y = Some(1450);

    link.send(&SetpointFrame::setpoints(0, 1500, 0, 0), &config);
    control.tick(0, &mut link, &mut table, &mut events);

    assert_eq!(table.sensor_reads, 1);
    assert_eq!(control.pid(Axis::Y).state().input, 1450.0);
    assert!(control.snapshot().corrections.y > 0.0);
}

#[test]
fn missing_sensor_reading_means_no_error() {
    let mut config = setpoint_config();
    config.axes.x.measurement = MeasurementSource::Sensor;
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send(&SetpointFrame::setpoints(1800, 0, 0, 0), &config);
    control.tick(0, &mut link, &mut table, &mut events);

    assert_eq!(control.pid(Axis::X).state().input, 1800.0);
    assert_eq!(control.snapshot().corrections.x, 0.0);
}

#[test]
fn z_setpoint_lifts_all_servos_equally() {
    let mut config = setpoint_config();
    config.axes.z.measurement = MeasurementSource::Fixed(1500);
    config.axes.x.measurement = MeasurementSource::Commanded;
    config.axes.y.measurement = MeasurementSource::Commanded;
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send(&SetpointFrame::setpoints(1500, 1500, 1600, 0), &config);
    let cmd = control.tick(0, &mut link, &mut table, &mut events);

    // +100 logical units on every channel; 0.55 µs per unit, mirrored.
    assert_eq!(cmd.pulses_us, [1670, 1670, 1674]);
}

#[test]
fn reset_framer_command_drops_partial_frame() {
    let config = ControllerConfig::default();
    let (mut control, mut link, mut table, mut events) = make_loop(config);

    link.send_raw(&[0x05, 0xDC, 0x05]);
    control.tick(0, &mut link, &mut table, &mut events);
    assert_eq!(control.framer().buffered(), 3);

    control.handle_command(LoopCommand::ResetFramer, &mut events);
    assert_eq!(control.framer().buffered(), 0);
}
