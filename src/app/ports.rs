//! Port traits: the hexagonal boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlCore (domain)
//! ```
//!
//! Driven adapters (PWM chips, the input bridge, the status display, the
//! battery ADC, event sinks) implement these traits.  The
//! [`ControlCore`](super::service::ControlCore) and the runtime consume
//! them via generics, so the domain never touches hardware directly.
//!
//! Every port call is blocking.  The runtime keeps actuator writes on the
//! actuation thread and everything else on the IO thread, so a stalled bus
//! write cannot starve input handling or pulse counting.

use crate::config::MAX_DUTY;
use crate::error::{ActuatorError, InputError, SensorError};
use crate::input::InputEvent;

use super::events::{AppEvent, StatusSnapshot};

// ───────────────────────────────────────────────────────────────
// Actuator channel (driven adapter: domain → PWM hardware)
// ───────────────────────────────────────────────────────────────

/// A bank of 12-bit PWM channels addressable by index.
///
/// `set` is a register-style write: the output goes high at count `on_time`
/// and low at count `off_time` within each 4096-count period.  Values above
/// 4095 are clamped by the implementation.
pub trait ActuatorChannel {
    fn set(&mut self, channel: u8, on_time: u16, off_time: u16) -> Result<(), ActuatorError>;

    /// Write a plain duty cycle (`on = 0`, `off = duty`), clamped to 4095.
    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), ActuatorError> {
        self.set(channel, 0, duty.min(MAX_DUTY))
    }
}

impl<T: ActuatorChannel + ?Sized> ActuatorChannel for &mut T {
    fn set(&mut self, channel: u8, on_time: u16, off_time: u16) -> Result<(), ActuatorError> {
        (**self).set(channel, on_time, off_time)
    }
}

// ───────────────────────────────────────────────────────────────
// Input source (driving adapter: gamepad bridge → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking source of decoded input events.
pub trait InputSource {
    /// Next pending event, or `Ok(None)` if nothing is queued.
    ///
    /// A non-recoverable error (see [`InputError::is_recoverable`]) means
    /// the source will never produce events again.
    fn poll_event(&mut self) -> Result<Option<InputEvent>, InputError>;
}

// ───────────────────────────────────────────────────────────────
// Status renderer (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Paints a [`StatusSnapshot`] once per display tick.
pub trait StatusRenderer {
    fn render(&mut self, snapshot: &StatusSnapshot);
}

// ───────────────────────────────────────────────────────────────
// Battery port (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

pub trait BatteryPort {
    /// Pack voltage in volts.
    fn read_voltage(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The control core emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
