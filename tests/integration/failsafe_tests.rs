//! Link-loss failsafe: watchdog trip, fallback setpoint and recovery.

use balltable::app::events::LoopEvent;
use balltable::app::service::ControlLoop;
use balltable::axes::{Axes, Axis};
use balltable::config::ControllerConfig;
use balltable::protocol::SetpointFrame;

use crate::mock_hw::{EventLog, MockLink, MockTable, PERIOD_US};

struct Rig {
    control: ControlLoop,
    link: MockLink,
    table: MockTable,
    events: EventLog,
    config: ControllerConfig,
    now_us: u64,
}

impl Rig {
    fn new() -> Self {
        let config = ControllerConfig::default();
        Self {
            control: ControlLoop::new(config).expect("valid config"),
            link: MockLink::new(),
            table: MockTable::new(),
            events: EventLog::new(),
            config,
            now_us: 0,
        }
    }

    fn tick(&mut self) {
        self.control
            .tick(self.now_us, &mut self.link, &mut self.table, &mut self.events);
        self.now_us += PERIOD_US;
    }

    fn send(&mut self, frame: SetpointFrame) {
        self.link.send(&frame, &self.config);
    }

    fn lost_events(&self) -> usize {
        self.events.count(|e| matches!(e, LoopEvent::LinkLost { .. }))
    }

    fn restored_events(&self) -> usize {
        self.events.count(|e| *e == LoopEvent::LinkRestored)
    }
}

fn target() -> SetpointFrame {
    SetpointFrame::tracking(1450, 1550, 1600, 1400, 0)
}

#[test]
fn link_is_lost_at_boot() {
    let mut rig = Rig::new();
    assert!(rig.control.is_link_lost());
    rig.tick();
    assert!(rig.control.is_link_lost());
    assert_eq!(rig.control.snapshot().setpoint, rig.config.fallback_setpoint);
    // Boot state is not a transition.
    assert_eq!(rig.lost_events(), 0);
}

#[test]
fn trips_after_timeout_plus_one_silent_ticks() {
    let mut rig = Rig::new();
    rig.send(target());
    rig.tick();
    assert!(!rig.control.is_link_lost());
    assert_eq!(rig.control.watchdog().cycles(), 0);

    let timeout = rig.config.link.watchdog_timeout_cycles;
    for _ in 0..timeout {
        rig.tick();
    }
    assert!(!rig.control.is_link_lost(), "exactly timeout cycles is still alive");

    rig.tick();
    assert!(rig.control.is_link_lost());
    assert_eq!(rig.lost_events(), 1);
    assert_eq!(rig.control.snapshot().setpoint, rig.config.fallback_setpoint);
}

#[test]
fn stays_tripped_through_noise() {
    let mut rig = Rig::new();
    rig.send(target());
    rig.tick();
    for _ in 0..=rig.config.link.watchdog_timeout_cycles {
        rig.tick();
    }
    assert!(rig.control.is_link_lost());

    for i in 0..200u32 {
        rig.link.send_raw(&[(i * 37) as u8 & 0x7F, 0xEE, (i * 11) as u8 & 0x7F, 0xEF]);
        rig.tick();
        assert!(rig.control.is_link_lost());
    }
    assert_eq!(rig.lost_events(), 1);
}

#[test]
fn next_valid_frame_clears_trip_within_the_tick() {
    let mut rig = Rig::new();
    rig.send(target());
    rig.tick();
    for _ in 0..=rig.config.link.watchdog_timeout_cycles {
        rig.tick();
    }
    assert!(rig.control.is_link_lost());

    rig.send(target());
    rig.tick();
    assert!(!rig.control.is_link_lost());
    assert_eq!(rig.control.watchdog().cycles(), 0);
    assert_eq!(rig.control.snapshot().setpoint, Axes::new(1600, 1400, 1500));
    assert_eq!(rig.restored_events(), 2);
}

#[test]
fn fallback_drives_table_to_neutral() {
    let mut rig = Rig::new();
    rig.send(target());
    rig.tick();

    for _ in 0..=rig.config.link.watchdog_timeout_cycles {
        rig.tick();
    }
    let neutral = balltable::control::KinematicMapper::new(rig.config.kinematics).neutral_command();
    assert_eq!(rig.table.last(), Some(&neutral));
    assert_eq!(rig.control.snapshot().corrections, Axes::splat(0.0));
}

#[test]
fn link_loss_clears_controller_memory() {
    let mut rig = Rig::new();
    for _ in 0..50 {
        rig.send(target());
        rig.tick();
    }
    assert_ne!(rig.control.pid(Axis::X).state().integral, 0.0);

    for _ in 0..=rig.config.link.watchdog_timeout_cycles {
        rig.tick();
    }
    for axis in Axis::ALL {
        let s = rig.control.pid(axis).state();
        assert_eq!(s.integral, 0.0, "{axis:?}");
        assert_eq!(s.filtered_error, 0.0, "{axis:?}");
    }
}

#[test]
fn stalled_loop_counts_real_elapsed_time() {
    let mut rig = Rig::new();
    rig.send(target());
    rig.tick();

    // A single tick arriving 600 ms late exceeds the 500 ms timeout.
    rig.now_us += 600_000;
    rig.tick();
    assert!(rig.control.is_link_lost());
    assert_eq!(rig.lost_events(), 1);
}
