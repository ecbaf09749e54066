//! UART receive pump.
//!
//! Moves bytes from an `embedded-hal-nb` serial receiver into the
//! [`RxQueue`](crate::rx_queue::RxQueue) producer.  On target this is
//! called from the UART receive interrupt; on the host the replay
//! driver calls it directly.  It never blocks: it stops at the first
//! `WouldBlock`.

use embedded_hal_nb::serial::{Error, ErrorKind, Read};
use log::warn;

use crate::rx_queue::{RX_QUEUE_CAP, RxProducer};

/// Most reads per [`UartRxPump::pump`] call, so a receiver that never
/// reports `WouldBlock` cannot stall the caller.
pub const PUMP_READ_LIMIT: usize = RX_QUEUE_CAP;

/// Receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    /// Bytes placed in the queue.
    pub received: u32,
    /// Bytes dropped because the queue was full.
    pub queue_overruns: u32,
    /// Hardware overruns reported by the receiver.
    pub uart_overruns: u32,
    /// Framing, parity and noise errors.
    pub line_errors: u32,
}

/// Serial receiver feeding the RX queue.
pub struct UartRxPump<U> {
    uart: U,
    stats: RxStats,
}

impl<U: Read<u8>> UartRxPump<U> {
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            stats: RxStats::default(),
        }
    }

    /// Drain pending bytes into `queue`.  Returns the number enqueued.
    pub fn pump(&mut self, queue: &mut RxProducer<'_>) -> usize {
        let mut enqueued = 0;
        for _ in 0..PUMP_READ_LIMIT {
            match self.uart.read() {
                Ok(byte) => {
                    if queue.enqueue(byte).is_ok() {
                        enqueued += 1;
                        self.stats.received = self.stats.received.wrapping_add(1);
                    } else {
                        self.stats.queue_overruns = self.stats.queue_overruns.wrapping_add(1);
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => self.record_error(e.kind()),
            }
        }
        enqueued
    }

    pub fn stats(&self) -> RxStats {
        self.stats
    }

    pub fn into_inner(self) -> U {
        self.uart
    }

    fn record_error(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Overrun => {
                self.stats.uart_overruns = self.stats.uart_overruns.wrapping_add(1);
            }
            _ => {
                self.stats.line_errors = self.stats.line_errors.wrapping_add(1);
            }
        }
        warn!("UART RX error: {:?}", kind);
    }
}
