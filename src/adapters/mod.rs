//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to                    |
//! |----------------|----------------|--------------------------------|
//! | `line_input`   | InputSource    | UART console / stdin lines     |
//! | `log_renderer` | StatusRenderer | Serial log output              |
//! | `log_sink`     | EventSink      | Serial log output              |
//! | `time`         |:              | ESP32 high-resolution timer    |
//!
//! The PWM and battery ports are implemented directly by the chip
//! drivers in [`crate::drivers`].

pub mod line_input;
pub mod log_renderer;
pub mod log_sink;
pub mod time;
