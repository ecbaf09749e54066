//! Interrupt-fed receive queue.
//!
//! The UART interrupt appends raw bytes; the control loop drains them
//! once per tick.  This is the only point where two execution contexts
//! touch the same data, so it is a lock-free single-producer
//! single-consumer ring and nothing else is shared.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  UART ISR   │────▶│   RxQueue    │────▶│ ControlLoop  │
//! │ (producer)  │     │ (lock-free)  │     │ (consumer)   │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue itself is owned by the caller (typically a `static` or a
//! `static_cell` on target) and split once at startup:
//!
//! ```
//! use balltable::rx_queue::RxQueue;
//!
//! let mut queue = RxQueue::new();
//! let (mut producer, mut consumer) = queue.split();
//! producer.enqueue(0xEE).unwrap();
//! assert_eq!(consumer.dequeue(), Some(0xEE));
//! ```

use heapless::spsc::{Consumer, Producer, Queue};

use crate::app::ports::ByteSource;

/// Queue slots.  One slot is kept free by the ring, so this holds
/// `RX_QUEUE_CAP - 1` bytes: a little over five frames, or roughly two
/// ticks of traffic at 57600 baud.
pub const RX_QUEUE_CAP: usize = 64;

/// Receive byte queue.
pub type RxQueue = Queue<u8, RX_QUEUE_CAP>;

/// Interrupt-side handle.
pub type RxProducer<'a> = Producer<'a, u8, RX_QUEUE_CAP>;

/// Control-loop-side handle.
pub type RxConsumer<'a> = Consumer<'a, u8, RX_QUEUE_CAP>;

impl<const N: usize> ByteSource for Consumer<'_, u8, N> {
    fn read_byte(&mut self) -> Option<u8> {
        self.dequeue()
    }
}
