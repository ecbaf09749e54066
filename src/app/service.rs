//! Control loop — the hexagonal core.
//!
//! [`ControlLoop`] owns every piece of mutable state in the system: the
//! frame decoder, the link watchdog, the three axis controllers and the
//! kinematic mapper.  Hardware is reached only through the port traits
//! passed into [`ControlLoop::tick`].
//!
//! ```text
//!  ByteSource ──▶ ┌──────────────────────────────┐ ──▶ ServoPort
//!                 │          ControlLoop          │
//!  SensorPort ──▶ │ Framer · Watchdog · PID · Map │ ──▶ EventSink
//!                 └──────────────────────────────┘
//! ```

use log::info;

use crate::axes::{Axes, Axis};
use crate::config::{ControllerConfig, MeasurementSource};
use crate::control::kinematics::{KinematicMapper, ServoCommand};
use crate::control::pid::AxisPid;
use crate::error::Result;
use crate::protocol::frame::SetpointFrame;
use crate::protocol::framer::SerialFramer;
use crate::rx_queue::RX_QUEUE_CAP;
use crate::safety::{LinkTransition, LinkWatchdog};

use super::commands::LoopCommand;
use super::events::{LoopEvent, LoopSnapshot};
use super::ports::{ByteSource, Clock, EventSink, SensorPort, ServoPort};

/// Most bytes consumed from the byte source in one tick.
pub const RX_BURST_LIMIT: usize = RX_QUEUE_CAP;

/// Longest tick, in nominal cycles, the controllers integrate over.
/// A stalled loop resumes with a bounded step instead of one huge one.
pub const MAX_DT_CYCLES: f32 = 4.0;

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

/// The fixed-period control loop.
pub struct ControlLoop {
    config: ControllerConfig,
    framer: SerialFramer,
    watchdog: LinkWatchdog,
    pids: Axes<AxisPid>,
    mapper: KinematicMapper,
    /// Most recent valid frame.
    last_frame: Option<SetpointFrame>,
    /// Setpoint applied on the previous tick.
    setpoint: Axes<i16>,
    corrections: Axes<f32>,
    command: ServoCommand,
    last_tick_us: Option<u64>,
    /// Elapsed time not yet counted as a whole watchdog cycle.
    carry_us: u64,
    tick_count: u64,
}

impl ControlLoop {
    /// Validate `config` and build the loop.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let mapper = KinematicMapper::new(config.kinematics);
        let command = mapper.neutral_command();

        Ok(Self {
            framer: SerialFramer::new(config.link.frame),
            watchdog: LinkWatchdog::new(config.link.watchdog_timeout_cycles),
            pids: config.axes.map(|a| AxisPid::new(a.gains)),
            mapper,
            last_frame: None,
            setpoint: config.fallback_setpoint,
            corrections: Axes::splat(0.0),
            command,
            last_tick_us: None,
            carry_us: 0,
            tick_count: 0,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the loop.  Ticking does not require this.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "ControlLoop started: period={}us, watchdog={} cycles, layout={:?}, baud={}",
            self.config.tick_period_us,
            self.config.link.watchdog_timeout_cycles,
            self.config.link.frame.layout,
            self.config.link.baud_rate,
        );
        sink.emit(&LoopEvent::Started {
            tick_period_us: self.config.tick_period_us,
            watchdog_timeout_cycles: self.config.link.watchdog_timeout_cycles,
        });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: bytes → watchdog → setpoint → PID → servos.
    ///
    /// `now_us` is a monotonic timestamp taken at the start of the tick;
    /// the watchdog and the controllers both work from the real elapsed
    /// time rather than the nominal period.
    pub fn tick(
        &mut self,
        now_us: u64,
        rx: &mut impl ByteSource,
        hw: &mut (impl SensorPort + ServoPort),
        sink: &mut impl EventSink,
    ) -> ServoCommand {
        self.tick_count += 1;

        // 1. Ingest bytes; the newest valid frame wins
        let mut received = None;
        for _ in 0..RX_BURST_LIMIT {
            let Some(byte) = rx.read_byte() else { break };
            if let Some(frame) = self.framer.push(byte) {
                received = Some(frame);
            }
        }

        // 2. Watchdog
        let (cycles, dt) = self.elapsed(now_us);
        let transition = match received {
            Some(frame) => {
                self.last_frame = Some(frame);
                self.watchdog.feed()
            }
            None => self.watchdog.advance(cycles),
        };
        match transition {
            Some(LinkTransition::Lost) => {
                self.reset_controllers();
                sink.emit(&LoopEvent::LinkLost {
                    cycles: self.watchdog.cycles(),
                });
            }
            Some(LinkTransition::Restored) => sink.emit(&LoopEvent::LinkRestored),
            None => {}
        }

        // 3. Effective setpoint, re-evaluated every tick
        let frame = if self.watchdog.is_tripped() {
            None
        } else {
            self.last_frame
        };
        let fallback = self.config.fallback_setpoint;
        let setpoint = Axes {
            x: frame.and_then(|f| f.setpoint.x).unwrap_or(fallback.x),
            y: frame.and_then(|f| f.setpoint.y).unwrap_or(fallback.y),
            z: frame.and_then(|f| f.setpoint.z).unwrap_or(fallback.z),
        };

        // 4. Axis controllers
        let mut corrections = Axes::splat(0.0);
        for axis in Axis::ALL {
            let target = *setpoint.get(axis);
            let input = self.measured_input(axis, target, frame.as_ref(), &mut *hw);
            *corrections.get_mut(axis) = self.pids.get_mut(axis).update(f32::from(target), input, dt);
        }
        self.setpoint = setpoint;
        self.corrections = corrections;

        // 5. Kinematics
        let command = self.mapper.map(corrections);

        // 6. Emit
        hw.write_pulses(&command);
        self.command = command;
        command
    }

    /// [`tick`](Self::tick) stamped with the current time from `clock`.
    pub fn tick_at(
        &mut self,
        clock: &impl Clock,
        rx: &mut impl ByteSource,
        hw: &mut (impl SensorPort + ServoPort),
        sink: &mut impl EventSink,
    ) -> ServoCommand {
        self.tick(clock.now_us(), rx, hw, sink)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(&mut self, cmd: LoopCommand, sink: &mut impl EventSink) {
        match cmd {
            LoopCommand::ResetControllers => {
                self.reset_controllers();
                info!("Controllers reset on request");
                sink.emit(&LoopEvent::ControllersReset);
            }
            LoopCommand::ResetFramer => {
                self.framer.reset();
                info!("Framer reset on request");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> LoopSnapshot {
        LoopSnapshot {
            tick_count: self.tick_count,
            link_lost: self.watchdog.is_tripped(),
            cycles_since_frame: self.watchdog.cycles(),
            setpoint: self.setpoint,
            corrections: self.corrections,
            command: self.command,
            last_status: self.last_frame.map(|f| f.status),
            framer: self.framer.stats(),
        }
    }

    /// The watchdog's tripped flag.
    pub fn is_link_lost(&self) -> bool {
        self.watchdog.is_tripped()
    }

    pub fn watchdog(&self) -> &LinkWatchdog {
        &self.watchdog
    }

    pub fn framer(&self) -> &SerialFramer {
        &self.framer
    }

    pub fn pid(&self, axis: Axis) -> &AxisPid {
        self.pids.get(axis)
    }

    /// Most recent valid frame, even if the link has since been lost.
    pub fn last_frame(&self) -> Option<&SetpointFrame> {
        self.last_frame.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn reset_controllers(&mut self) {
        for axis in Axis::ALL {
            self.pids.get_mut(axis).reset();
        }
    }

    /// Whole watchdog cycles and controller `dt` (in cycles) since the
    /// previous tick.  The first tick counts as exactly one period.
    fn elapsed(&mut self, now_us: u64) -> (u32, f32) {
        let period = u64::from(self.config.tick_period_us);
        let elapsed = self
            .last_tick_us
            .map_or(period, |prev| now_us.saturating_sub(prev));
        self.last_tick_us = Some(now_us);

        let total = self.carry_us.saturating_add(elapsed);
        self.carry_us = total % period;
        let cycles = u32::try_from(total / period).unwrap_or(u32::MAX);

        let dt = (elapsed as f32 / period as f32).min(MAX_DT_CYCLES);
        (cycles, dt)
    }

    /// Measured input for `axis`; equals `setpoint` when the configured
    /// source has nothing this tick.
    fn measured_input(
        &self,
        axis: Axis,
        setpoint: i16,
        frame: Option<&SetpointFrame>,
        sensors: &mut impl SensorPort,
    ) -> f32 {
        let value = match self.config.axes.get(axis).measurement {
            MeasurementSource::Frame => frame.and_then(|f| *f.measured.get(axis)),
            MeasurementSource::Sensor => sensors.read_position(axis),
            MeasurementSource::Fixed(v) => Some(v),
            MeasurementSource::Commanded => Some(*self.setpoint.get(axis)),
        };
        f32::from(value.unwrap_or(setpoint))
    }
}
