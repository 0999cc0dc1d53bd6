//! Outbound application events and status snapshots.
//!
//! The [`ControlCore`](super::service::ControlCore) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port and publishes a
//! [`ControlStatus`] after every tick.  The display task folds that status
//! together with wheel speed and battery into a [`StatusSnapshot`].

use core::fmt;

use crate::control::transmission::TransmissionMode;
use crate::drivers::motor::Direction;
use crate::error::ActuatorError;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The control core has been built and driven to neutral.
    Started { gear: usize, mode: TransmissionMode },

    /// The transmission changed gear (manually or automatically).
    GearChanged { from: usize, to: usize, mode: TransmissionMode },

    /// Manual/automatic toggle.
    ModeChanged(TransmissionMode),

    /// A motor channel write failed; the next tick re-asserts it.
    ActuatorFault { channel: u8, error: ActuatorError },

    /// A steering write failed; the previous angle is kept.
    SteeringRejected { angle: f32, error: ActuatorError },

    /// Final neutral actuation before the bus is released.
    Neutralized { complete: bool },
}

/// What the actuation task publishes after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlStatus {
    /// Signed commanded speed (percent).
    pub speed_percent: f32,
    pub target_percent: f32,
    pub steering_angle: f32,
    pub gear: usize,
    pub mode: TransmissionMode,
    pub direction: Direction,
}

impl Default for ControlStatus {
    fn default() -> Self {
        Self {
            speed_percent: 0.0,
            target_percent: 0.0,
            steering_angle: 0.0,
            gear: 0,
            mode: TransmissionMode::Manual,
            direction: Direction::Forward,
        }
    }
}

/// Read-only snapshot handed to the status display each refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Measured road speed from the wheel encoder.
    pub speed_kmh: f32,
    /// Zero-based gear index.
    pub gear: usize,
    pub mode: TransmissionMode,
    pub direction: Direction,
    /// `None` when the battery ADC could not be read.
    pub battery_percent: Option<u8>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Forward => "FWD",
            Direction::Reverse => "REV",
        };
        let mode = match self.mode {
            TransmissionMode::Manual => 'M',
            TransmissionMode::Automatic => 'A',
        };
        write!(f, "{:5.1} km/h | G{}{} | {}", self.speed_kmh, self.gear + 1, mode, dir)?;
        match self.battery_percent {
            Some(p) => write!(f, " | bat {}%", p),
            None => write!(f, " | bat --"),
        }
    }
}
