//! Inbound commands to the control core.
//!
//! These are the setters the outside world (the input router, a direct
//! API caller) may invoke.  The actuation task owns the
//! [`ControlCore`](super::service::ControlCore) exclusively; everyone else
//! sends one of these over the command channel.

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleCommand {
    /// Steer to the given angle in degrees (negative = left).
    SetSteering(f32),

    /// Drive the motors at a signed percentage right now, bypassing the
    /// pedal integrator.  Subsequent ticks continue from this speed.
    SetSpeed(f32),

    /// Throttle pedal position in `[0, 1]`.
    Accelerate(f32),

    /// Brake pedal position in `[0, 1]`.
    Brake(f32),

    /// Manual mode only: next gear up.
    ShiftUp,

    /// Manual mode only: next gear down.
    ShiftDown,

    /// Flip between manual and automatic transmission.
    ToggleTransmissionMode,

    /// Release both pedals and cut the motors immediately.
    Stop,
}
