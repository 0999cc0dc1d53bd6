//! Operator input: decoded gamepad events and their mapping to commands.
//!
//! Device enumeration and raw event decoding happen off-board in the
//! gamepad bridge.  What reaches the firmware is a stream of
//! [`InputEvent`]s, either decoded from the [`line_protocol`] or produced
//! by any other [`InputSource`](crate::app::ports::InputSource).

pub mod line_protocol;
pub mod router;

pub use router::{InputRouter, Routed};

/// One discrete operator input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Analog axis.  Sticks are normalised to `[-1, 1]`, triggers to `[0, 1]`.
    Axis { id: u8, value: f32 },
    /// Digital button edge.
    Button { id: u8, pressed: bool },
}
