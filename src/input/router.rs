//! Maps input events onto [`VehicleCommand`]s.
//!
//! | Input                    | Command                           |
//! |--------------------------|-----------------------------------|
//! | steering axis `v`        | `SetSteering(v * steering_range)` |
//! | throttle axis `v`        | `Accelerate(v)`                   |
//! | brake axis `v`           | `Brake(v)`                        |
//! | shift-up button press    | `ShiftUp`                         |
//! | shift-down button press  | `ShiftDown`                       |
//! | mode button press        | `ToggleTransmissionMode`          |
//! | stop button press        | `Stop`                            |
//! | shutdown button press    | shutdown request                  |
//!
//! Button releases and unmapped ids produce nothing.

use crate::app::commands::VehicleCommand;
use crate::config::InputConfig;
use crate::error::ConfigError;

use super::InputEvent;

/// What an input event asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Routed {
    Command(VehicleCommand),
    /// Stop the whole vehicle runtime.
    Shutdown,
}

pub struct InputRouter {
    mapping: InputConfig,
}

impl InputRouter {
    pub fn new(mapping: InputConfig) -> Result<Self, ConfigError> {
        mapping.validate()?;
        Ok(Self { mapping })
    }

    pub fn route(&self, event: &InputEvent) -> Option<Routed> {
        match *event {
            InputEvent::Axis { id, value } => self.route_axis(id, value).map(Routed::Command),
            InputEvent::Button { id, pressed: true } => self.route_press(id),
            InputEvent::Button { pressed: false, .. } => None,
        }
    }

    fn route_axis(&self, id: u8, value: f32) -> Option<VehicleCommand> {
        if !value.is_finite() {
            return None;
        }
        let m = &self.mapping;
        if id == m.steering_axis {
            Some(VehicleCommand::SetSteering(value.clamp(-1.0, 1.0) * m.steering_range_deg))
        } else if id == m.throttle_axis {
            Some(VehicleCommand::Accelerate(value.clamp(0.0, 1.0)))
        } else if id == m.brake_axis {
            Some(VehicleCommand::Brake(value.clamp(0.0, 1.0)))
        } else {
            None
        }
    }

    fn route_press(&self, id: u8) -> Option<Routed> {
        let m = &self.mapping;
        // Safety buttons first, in case a mapping reuses an id.
        if m.stop_buttons.contains(&id) {
            Some(Routed::Command(VehicleCommand::Stop))
        } else if id == m.shutdown_button {
            Some(Routed::Shutdown)
        } else if id == m.shift_up_button {
            Some(Routed::Command(VehicleCommand::ShiftUp))
        } else if id == m.shift_down_button {
            Some(Routed::Command(VehicleCommand::ShiftDown))
        } else if id == m.toggle_mode_button {
            Some(Routed::Command(VehicleCommand::ToggleTransmissionMode))
        } else {
            None
        }
    }
}
