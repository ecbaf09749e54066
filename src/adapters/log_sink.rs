//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing control-loop events through the
//! `log` facade (UART on target, `simple_logger` on the host).

use log::{info, warn};

use crate::app::events::LoopEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`LoopEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LoopEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            LoopEvent::Started {
                tick_period_us,
                watchdog_timeout_cycles,
            } => {
                info!(
                    "START | period={}us | watchdog={} cycles",
                    tick_period_us, watchdog_timeout_cycles
                );
            }
            LoopEvent::LinkLost { cycles } => {
                warn!("LINK | lost after {} cycles, holding fallback setpoint", cycles);
            }
            LoopEvent::LinkRestored => {
                info!("LINK | restored");
            }
            LoopEvent::ControllersReset => {
                info!("PID | all axes reset");
            }
        }
    }
}
