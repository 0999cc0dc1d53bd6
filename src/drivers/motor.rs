//! Rear drive motor wiring (dual H-bridge behind a 12-bit PWM chip).
//!
//! Each motor side uses three PWM channels: two direction inputs and one
//! enable.  The wiring table says which channels carry the duty value and
//! which are held at 0 for each direction.  Stopping writes 0 to every
//! channel in `0..stop_channel_count`, so a motor can never be left
//! energised by a channel the forward/reverse patterns forgot about.
//!
//! The driver is a dumb actuator: it writes a pattern and reports which
//! channels failed.  Speed smoothing lives in
//! [`DriveController`](crate::control::drive::DriveController).

use heapless::Vec;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ActuatorChannel;
use crate::config::PWM_CHANNELS;
use crate::error::{ActuatorError, ConfigError};

/// Upper bound on channels in one direction pattern.
pub const MAX_PATTERN_CHANNELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// `Reverse` iff the signed speed is negative.
    pub fn from_speed(speed: f32) -> Self {
        if speed < 0.0 { Self::Reverse } else { Self::Forward }
    }
}

/// What a channel carries while the motor is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLevel {
    /// The commanded duty value.
    Duty,
    /// Held at 0.
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDrive {
    pub channel: u8,
    pub level: ChannelLevel,
}

const fn duty(channel: u8) -> ChannelDrive {
    ChannelDrive { channel, level: ChannelLevel::Duty }
}

const fn off(channel: u8) -> ChannelDrive {
    ChannelDrive { channel, level: ChannelLevel::Off }
}

/// Channel table for both directions plus the stop sweep range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorWiring {
    /// Written in order for positive speeds.
    pub forward: Vec<ChannelDrive, MAX_PATTERN_CHANNELS>,
    /// Written in order for negative speeds.
    pub reverse: Vec<ChannelDrive, MAX_PATTERN_CHANNELS>,
    /// Stop zeroes channels `0..stop_channel_count`.
    pub stop_channel_count: u8,
}

impl Default for MotorWiring {
    /// Waveshare JetRacer motor board: left side IN1/IN2/ENA on 0/1/2,
    /// right side IN3/IN4/ENB on 5/6/7.
    fn default() -> Self {
        Self {
            forward: [duty(0), off(1), duty(2), duty(5), off(6), duty(7)]
                .into_iter()
                .collect(),
            reverse: [duty(0), duty(1), off(2), off(5), duty(6), duty(7)]
                .into_iter()
                .collect(),
            stop_channel_count: 9,
        }
    }
}

impl MotorWiring {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_channel_count == 0 || self.stop_channel_count > PWM_CHANNELS {
            return Err(ConfigError::Invalid("drive.wiring.stop_channel_count"));
        }
        if self.forward.is_empty() || self.reverse.is_empty() {
            return Err(ConfigError::Invalid("drive.wiring pattern (empty)"));
        }
        let outside_stop = |p: &[ChannelDrive]| p.iter().any(|d| d.channel >= self.stop_channel_count);
        if outside_stop(self.forward.as_slice()) || outside_stop(self.reverse.as_slice()) {
            return Err(ConfigError::Invalid("drive.wiring channel outside stop sweep"));
        }
        Ok(())
    }

    pub fn pattern(&self, direction: Direction) -> &[ChannelDrive] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        }
    }
}

/// Outcome of one best-effort pattern write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotorSweep {
    /// Duty value carried by the `Duty` channels (0 for a stop).
    pub duty: u16,
    /// Channels successfully written.
    pub written: u8,
    /// Channels that failed, with the error each one returned.
    pub failed: Vec<(u8, ActuatorError), 16>,
}

impl MotorSweep {
    /// Every channel in the pattern reflects the commanded state.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, channel: u8, result: Result<(), ActuatorError>) {
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!("MOTOR | ch{} write failed: {}", channel, e);
                // 16 slots cover every channel a chip has.
                let _ = self.failed.push((channel, e));
            }
        }
    }
}

/// Write the direction pattern with `duty` on the enable/drive channels.
/// Every channel is attempted even if an earlier one failed.
pub fn drive<A: ActuatorChannel + ?Sized>(
    wiring: &MotorWiring,
    out: &mut A,
    direction: Direction,
    duty: u16,
) -> MotorSweep {
    let mut sweep = MotorSweep { duty, ..MotorSweep::default() };
    for d in wiring.pattern(direction) {
        let value = match d.level {
            ChannelLevel::Duty => duty,
            ChannelLevel::Off => 0,
        };
        sweep.record(d.channel, out.set_duty(d.channel, value));
    }
    sweep
}

/// Write 0 to every channel in the stop range, unconditionally.
pub fn stop<A: ActuatorChannel + ?Sized>(wiring: &MotorWiring, out: &mut A) -> MotorSweep {
    let mut sweep = MotorSweep::default();
    for channel in 0..wiring.stop_channel_count {
        sweep.record(channel, out.set_duty(channel, 0));
    }
    sweep
}
