//! Unified error types for the JetCar firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! runtime's tick-boundary error handling uniform.  All variants are `Copy`
//! so they can be carried through the control core and event sink without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A PWM channel write or read-back failed.
    Actuator(ActuatorError),
    /// The input source is unavailable or sent garbage.
    Input(InputError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// A sensor (battery ADC) could not be read.
    Sensor(SensorError),
    /// Peripheral initialisation or task lifecycle failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// The register write did not complete on the bus.
    BusWrite,
    /// Reading registers back (verification or mode readout) failed.
    BusRead,
    /// Read-back after a write did not match what was written.
    VerifyMismatch { channel: u8 },
    /// The chip has 16 channels; anything above is a wiring/config bug.
    ChannelOutOfRange(u8),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusWrite => write!(f, "bus write failed"),
            Self::BusRead => write!(f, "bus read failed"),
            Self::VerifyMismatch { channel } => {
                write!(f, "read-back mismatch on channel {channel}")
            }
            Self::ChannelOutOfRange(ch) => write!(f, "channel {ch} out of range"),
        }
    }
}

impl core::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// No input device or bridge is present.
    Unavailable,
    /// The input stream ended or its reader failed.
    Disconnected,
    /// A line or event could not be decoded.
    Malformed,
}

impl InputError {
    /// Whether the source can still produce events after this error.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::Malformed)
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "input source unavailable"),
            Self::Disconnected => write!(f, "input source disconnected"),
            Self::Malformed => write!(f, "malformed input event"),
        }
    }
}

impl core::error::Error for InputError {}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Configuration problems are fatal at startup.  Values are rejected, never
/// clamped into something that merely looks safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse,
    /// A scalar parameter is out of its allowed range.
    Invalid(&'static str),
    /// A gear or shift-table entry is inconsistent.
    Gear { gear: usize, reason: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "could not parse configuration"),
            Self::Invalid(what) => write!(f, "invalid {what}"),
            Self::Gear { gear, reason } => write!(f, "gear {gear}: {reason}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I²C read returned an error.
    BusRead,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusRead => write!(f, "bus read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
