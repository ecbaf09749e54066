//! Fuzz target: `SerialFramer::push`
//!
//! Drives arbitrary byte sequences through the frame decoder under every
//! layout and asserts that it never panics, never holds more than one
//! frame of bytes, and that every frame it yields re-encodes to the
//! bytes it was decoded from.
//!
//! cargo fuzz run fuzz_framer

#![no_main]

use balltable::protocol::{FrameConfig, FrameLayout, SerialFramer, encode_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for layout in [FrameLayout::Tracking, FrameLayout::Setpoints] {
        for check_byte in [true, false] {
            let config = FrameConfig {
                layout,
                check_byte,
                ..FrameConfig::default()
            };
            let mut framer = SerialFramer::new(config);
            let len = config.frame_len();

            for (i, &b) in data.iter().enumerate() {
                if let Some(frame) = framer.push(b) {
                    assert!(i + 1 >= len, "frame from fewer bytes than a frame");
                    let mut buf = [0u8; 12];
                    let n = encode_frame(&frame, &config, &mut buf).expect("buffer fits");
                    assert_eq!(&buf[..n], &data[i + 1 - len..=i]);
                }
                assert!(framer.buffered() < len);
            }

            let stats = framer.stats();
            assert!(stats.frames as usize * len + stats.discarded_bytes as usize <= data.len());
        }
    }
});
