//! Gear/transmission state machine.
//!
//! ```text
//!   MANUAL:     shift_up / shift_down move one gear, clamped at the ends
//!   AUTOMATIC:  update_automatic(speed) moves at most one gear per call
//!
//!   gear 0 ──(speed > up[0])──▶ gear 1 ──(speed > up[1])──▶ gear 2 …
//!   gear 0 ◀──(speed < down[0])── gear 1 ◀──(speed < down[1])── gear 2 …
//! ```
//!
//! Mode is orthogonal to gear: toggling keeps the current gear.  Gear
//! changes never touch the vehicle speed; the control core clamps it.

use heapless::Vec;

use crate::config::{GearSpec, MAX_GEARS, TransmissionConfig};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionMode {
    Manual,
    Automatic,
}

impl TransmissionMode {
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Automatic)
    }
}

pub struct Transmission {
    gears: Vec<GearSpec, MAX_GEARS>,
    upshift_above: Vec<f32, MAX_GEARS>,
    downshift_below: Vec<f32, MAX_GEARS>,
    gear: usize,
    mode: TransmissionMode,
}

impl Transmission {
    /// Build from a validated table.  Inconsistent tables are refused here
    /// as well, so a `Transmission` always has a usable gear.
    pub fn new(config: &TransmissionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gears: config.gears.clone(),
            upshift_above: config.upshift_above.clone(),
            downshift_below: config.downshift_below.clone(),
            gear: config.initial_gear,
            mode: if config.automatic {
                TransmissionMode::Automatic
            } else {
                TransmissionMode::Manual
            },
        })
    }

    pub fn gear(&self) -> usize {
        self.gear
    }

    pub fn gear_count(&self) -> usize {
        self.gears.len()
    }

    pub fn mode(&self) -> TransmissionMode {
        self.mode
    }

    /// Returns `true` if the gear changed.
    pub fn shift_up(&mut self) -> bool {
        if self.mode.is_automatic() || self.gear + 1 >= self.gears.len() {
            return false;
        }
        self.gear += 1;
        true
    }

    /// Returns `true` if the gear changed.
    pub fn shift_down(&mut self) -> bool {
        if self.mode.is_automatic() || self.gear == 0 {
            return false;
        }
        self.gear -= 1;
        true
    }

    pub fn toggle_mode(&mut self) -> TransmissionMode {
        self.mode = match self.mode {
            TransmissionMode::Manual => TransmissionMode::Automatic,
            TransmissionMode::Automatic => TransmissionMode::Manual,
        };
        self.mode
    }

    /// Automatic shift check, called after every speed update.  Uses the
    /// speed magnitude so reversing shifts the same way.  Returns `true`
    /// if the gear changed (by exactly one).
    pub fn update_automatic(&mut self, speed: f32) -> bool {
        if !self.mode.is_automatic() || speed.is_nan() {
            return false;
        }
        let speed = speed.abs();

        if self.gear < self.upshift_above.len() && speed > self.upshift_above[self.gear] {
            self.gear += 1;
            true
        } else if self.gear > 0 && speed < self.downshift_below[self.gear - 1] {
            self.gear -= 1;
            true
        } else {
            false
        }
    }

    /// Throttle multiplier for the current gear.
    pub fn acceleration_rate(&self) -> f32 {
        self.current_range().acceleration_rate
    }

    pub fn current_range(&self) -> &GearSpec {
        // `gear < gears.len()` is kept by every mutator and `new`.
        &self.gears[self.gear]
    }

    /// Speed ceiling the drive must respect: the gear's top speed in
    /// manual mode, `absolute_max` in automatic mode (the gearbox shifts
    /// up instead of capping).
    pub fn speed_limit(&self, absolute_max: f32) -> f32 {
        match self.mode {
            TransmissionMode::Manual => self.current_range().max_speed.min(absolute_max),
            TransmissionMode::Automatic => absolute_max,
        }
    }
}
