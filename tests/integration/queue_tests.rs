//! UART pump → RX queue → control loop, end to end.

use std::collections::VecDeque;

use balltable::adapters::servo_pwm::PwmServoBank;
use balltable::adapters::uart_rx::UartRxPump;
use balltable::app::ports::{NoSensors, SensorPort, ServoPort};
use balltable::app::service::{ControlLoop, RX_BURST_LIMIT};
use balltable::axes::Axis;
use balltable::config::ControllerConfig;
use balltable::control::ServoCommand;
use balltable::protocol::SetpointFrame;
use balltable::rx_queue::RxQueue;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use embedded_hal_nb::serial::{self, Read};

use crate::mock_hw::{EventLog, MockLink, PERIOD_US};

// ── Peripheral mocks ──────────────────────────────────────────

struct ScriptedUart(VecDeque<u8>);

impl serial::ErrorType for ScriptedUart {
    type Error = serial::ErrorKind;
}

impl Read<u8> for ScriptedUart {
    fn read(&mut self) -> nb::Result<u8, serial::ErrorKind> {
        self.0.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Timer channel counting in microseconds over a 20 ms frame.
struct MicrosPwm(u16);

impl ErrorType for MicrosPwm {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for MicrosPwm {
    fn max_duty_cycle(&self) -> u16 {
        20_000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.0 = duty;
        Ok(())
    }
}

struct Table {
    sensors: NoSensors,
    servos: PwmServoBank<MicrosPwm>,
}

impl SensorPort for Table {
    fn read_position(&mut self, axis: Axis) -> Option<i16> {
        self.sensors.read_position(axis)
    }
}

impl ServoPort for Table {
    fn write_pulses(&mut self, command: &ServoCommand) {
        self.servos.write_pulses(command);
    }
}

fn encoded(frames: &[SetpointFrame], config: &ControllerConfig) -> VecDeque<u8> {
    let mut link = MockLink::new();
    for f in frames {
        link.send(f, config);
    }
    link.pending
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn uart_bytes_reach_the_servos() {
    let config = ControllerConfig::default();
    let mut control = ControlLoop::new(config).expect("valid config");
    let mut events = EventLog::new();
    let mut table = Table {
        sensors: NoSensors,
        servos: PwmServoBank::new([MicrosPwm(0), MicrosPwm(0), MicrosPwm(0)]),
    };

    let bytes = encoded(&[SetpointFrame::tracking(1500, 1500, 1500, 1500, 0)], &config);
    let mut pump = UartRxPump::new(ScriptedUart(bytes));

    let mut queue = RxQueue::new();
    let (mut producer, mut consumer) = queue.split();

    assert_eq!(pump.pump(&mut producer), 12);
    let cmd = control.tick(0, &mut consumer, &mut table, &mut events);

    assert!(!control.is_link_lost());
    let duties: Vec<u16> = table.servos.channels().iter().map(|c| c.0).collect();
    assert_eq!(duties, cmd.pulses_us.to_vec());
    assert_eq!(table.servos.write_errors(), 0);
}

#[test]
fn backlog_is_drained_over_several_ticks() {
    let config = ControllerConfig::default();
    let mut control = ControlLoop::new(config).expect("valid config");
    let mut events = EventLog::new();
    let mut table = Table {
        sensors: NoSensors,
        servos: PwmServoBank::new([MicrosPwm(0), MicrosPwm(0), MicrosPwm(0)]),
    };

    // More bytes than one tick may consume.
    let frames: Vec<_> = (0..8)
        .map(|i| SetpointFrame::tracking(1500, 1500, 1500 + i, 1500, i as u8))
        .collect();
    let mut link = MockLink::new();
    link.pending = encoded(&frames, &config);
    assert!(link.pending.len() > RX_BURST_LIMIT);

    control.tick(0, &mut link, &mut table, &mut events);
    assert_eq!(link.pending.len(), 8 * 12 - RX_BURST_LIMIT);
    assert_eq!(control.framer().stats().frames, (RX_BURST_LIMIT / 12) as u32);

    control.tick(PERIOD_US, &mut link, &mut table, &mut events);
    assert!(link.pending.is_empty());
    assert_eq!(control.snapshot().last_status, Some(7));
    assert_eq!(control.snapshot().setpoint.x, 1507);
}
