//! Ball-table replay driver.
//!
//! Feeds a captured serial byte stream through the control core at the
//! link's real byte rate, one control period at a time, and logs the
//! resulting servo commands.  No decision logic lives here.
//!
//! ```text
//! capture file ──▶ RxQueue ──▶ ControlLoop ──▶ log (servo pulses)
//!                              (simulated clock)
//! ```
//!
//! Usage: `balltable-replay <capture.bin> [config.json]`

use std::cell::Cell;
use std::{env, fs};

use anyhow::{Context, Result, bail};
use log::{LevelFilter, debug, info};

use balltable::adapters::log_sink::LogEventSink;
use balltable::app::ports::{Clock, NoSensors, SensorPort, ServoPort};
use balltable::app::service::ControlLoop;
use balltable::axes::Axis;
use balltable::config::ControllerConfig;
use balltable::control::ServoCommand;
use balltable::rx_queue::RxQueue;

// ── Replay rig ────────────────────────────────────────────────
//
// Stands in for the table: no position sensors, servo writes are
// logged instead of driven.

struct ReplayRig {
    sensors: NoSensors,
    writes: u64,
}

impl SensorPort for ReplayRig {
    fn read_position(&mut self, axis: Axis) -> Option<i16> {
        self.sensors.read_position(axis)
    }
}

impl ServoPort for ReplayRig {
    fn write_pulses(&mut self, command: &ServoCommand) {
        self.writes += 1;
        debug!(
            "SERVO | #{} | {} {} {}",
            self.writes, command.pulses_us[0], command.pulses_us[1], command.pulses_us[2]
        );
    }
}

/// Simulated time, advanced one period per tick.
#[derive(Default)]
struct ReplayClock {
    now_us: Cell<u64>,
}

impl ReplayClock {
    fn advance(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl Clock for ReplayClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let mut args = env::args().skip(1);
    let Some(capture_path) = args.next() else {
        bail!("usage: balltable-replay <capture.bin> [config.json]");
    };

    let config = match args.next() {
        Some(path) => {
            let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            ControllerConfig::from_json(&text).with_context(|| format!("loading {path}"))?
        }
        None => ControllerConfig::default(),
    };
    let capture = fs::read(&capture_path).with_context(|| format!("reading {capture_path}"))?;

    // 10 bits per byte on an 8N1 line
    let bytes_per_tick = (u64::from(config.link.baud_rate) * u64::from(config.tick_period_us)
        / 10_000_000)
        .max(1) as usize;
    info!(
        "Replaying {} bytes from {} ({} bytes per tick)",
        capture.len(),
        capture_path,
        bytes_per_tick
    );

    let mut control = ControlLoop::new(config)?;
    let mut sink = LogEventSink::new();
    let mut rig = ReplayRig {
        sensors: NoSensors,
        writes: 0,
    };
    control.start(&mut sink);

    let mut queue = RxQueue::new();
    let (mut producer, mut consumer) = queue.split();

    let period = u64::from(config.tick_period_us);
    let clock = ReplayClock::default();
    let mut dropped = 0usize;

    // Keep ticking past the end of the capture so a trailing silence
    // shows up as link loss.
    let drain_ticks = config.link.watchdog_timeout_cycles as usize + 1;
    let total_ticks = capture.len().div_ceil(bytes_per_tick) + drain_ticks;

    let mut chunks = capture.chunks(bytes_per_tick);
    for _ in 0..total_ticks {
        if let Some(chunk) = chunks.next() {
            for &byte in chunk {
                if producer.enqueue(byte).is_err() {
                    dropped += 1;
                }
            }
        }
        control.tick_at(&clock, &mut consumer, &mut rig, &mut sink);
        clock.advance(period);
    }

    let snap = control.snapshot();
    info!(
        "Done: ticks={} frames={} resyncs={} check_failures={} discarded={} dropped={} link_lost={} last={:?}",
        snap.tick_count,
        snap.framer.frames,
        snap.framer.resyncs,
        snap.framer.check_failures,
        snap.framer.discarded_bytes,
        dropped,
        snap.link_lost,
        snap.command.pulses_us,
    );
    Ok(())
}
