//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                         |
//! |-------------|--------------|-------------------------------------|
//! | `log_sink`  | EventSink    | `log` facade (serial console, host) |
//! | `servo_pwm` | ServoPort    | three `embedded-hal` PWM channels   |
//! | `time`      | Clock        | monotonic system timer              |
//! | `uart_rx`   | (RX queue)   | `embedded-hal-nb` serial receiver   |

pub mod log_sink;
pub mod servo_pwm;
pub mod time;
pub mod uart_rx;
