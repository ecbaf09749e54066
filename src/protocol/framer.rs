//! Streaming setpoint frame decoder.
//!
//! Bytes arrive one at a time from the receive queue and are collected
//! into a window exactly one frame long.  Once the window is full it is
//! validated: the two suffix bytes must sit at the trailing offset and,
//! when enabled, the check byte must match.  A window that fails either
//! test loses its oldest byte and the scan continues with the next
//! incoming byte, so line noise or a truncated frame costs at most one
//! frame before decoding is back in step.
//!
//! ```text
//!             valid                       next byte
//! Searching ─────────▶ Complete ───────────────────────▶ Accumulating
//!  ▲   │ invalid          ▲                                 │   │
//!  │   └─(drop oldest)    └───────────── valid ─────────────┘   │
//!  └──────────────────────── invalid (resync) ──────────────────┘
//! ```

use heapless::Deque;
use log::{debug, trace};

use super::frame::{FrameConfig, MAX_FRAME_LEN, SUFFIX_LEN, SetpointFrame, check_byte, decode_payload};

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Out of step with the sender; sliding one byte at a time.
    Searching,
    /// In step after a good frame; filling the next window.
    Accumulating,
    /// A frame was just emitted; the window is empty.
    Complete,
}

/// Running decode counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Frames that passed validation.
    pub frames: u32,
    /// Bytes dropped while looking for a frame boundary.
    pub discarded_bytes: u32,
    /// Windows whose suffix matched but whose check byte did not.
    pub check_failures: u32,
    /// Times an in-step decoder lost sync and went back to searching.
    pub resyncs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reject {
    Suffix,
    Check,
}

/// Byte-at-a-time frame decoder with resynchronisation.
pub struct SerialFramer {
    config: FrameConfig,
    state: FramerState,
    window: Deque<u8, MAX_FRAME_LEN>,
    stats: FramerStats,
}

impl SerialFramer {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            state: FramerState::Searching,
            window: Deque::new(),
            stats: FramerStats::default(),
        }
    }

    /// Push one byte.  Returns the frame it completes, if any.
    pub fn push(&mut self, byte: u8) -> Option<SetpointFrame> {
        if self.state == FramerState::Complete {
            self.state = FramerState::Accumulating;
        }

        if let Err(byte) = self.window.push_back(byte) {
            // Unreachable while the window is trimmed below; keep the
            // newest bytes if it ever happens.
            self.window.pop_front();
            self.stats.discarded_bytes = self.stats.discarded_bytes.saturating_add(1);
            let _ = self.window.push_back(byte);
        }

        if self.window.len() < self.config.frame_len() {
            return None;
        }

        match self.validate() {
            Ok(frame) => {
                self.window.clear();
                self.state = FramerState::Complete;
                self.stats.frames = self.stats.frames.saturating_add(1);
                trace!("Framer: frame {:?}", frame);
                Some(frame)
            }
            Err(reject) => {
                if reject == Reject::Check {
                    self.stats.check_failures = self.stats.check_failures.saturating_add(1);
                }
                if self.state == FramerState::Accumulating {
                    self.stats.resyncs = self.stats.resyncs.saturating_add(1);
                    debug!("Framer: lost sync ({:?}), searching", reject);
                    self.state = FramerState::Searching;
                }
                self.window.pop_front();
                self.stats.discarded_bytes = self.stats.discarded_bytes.saturating_add(1);
                None
            }
        }
    }

    /// Push a run of bytes.  Returns the last frame completed, if any.
    pub fn feed(&mut self, data: &[u8]) -> Option<SetpointFrame> {
        data.iter().fold(None, |last, &b| self.push(b).or(last))
    }

    /// Drop any partial frame and start searching again
    /// (e.g. after the serial port is reopened).
    pub fn reset(&mut self) {
        self.window.clear();
        self.state = FramerState::Searching;
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Bytes currently held in the window.
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    // ── Internal ──────────────────────────────────────────────────

    fn validate(&self) -> Result<SetpointFrame, Reject> {
        let len = self.config.frame_len();
        let mut buf = [0u8; MAX_FRAME_LEN];
        for (dst, src) in buf.iter_mut().zip(self.window.iter()) {
            *dst = *src;
        }
        let frame = &buf[..len];

        if frame[len - SUFFIX_LEN..] != self.config.suffix {
            return Err(Reject::Suffix);
        }

        let payload_len = self.config.payload_len();
        let payload = &frame[..payload_len];
        if self.config.check_byte && frame[payload_len] != check_byte(payload) {
            return Err(Reject::Check);
        }

        Ok(decode_payload(self.config.layout, payload))
    }
}
