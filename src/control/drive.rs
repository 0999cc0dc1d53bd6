//! Drive speed controller.
//!
//! Two-stage smoothing, evaluated once per actuation tick:
//!
//! 1. **Target** from pedal position:
//!    - throttle: `min(current + throttle * gear_rate, limit)`
//!    - brake:    `current` moved toward 0 by `brake * brake_rate`
//!    - neither:  `current` moved toward 0 by `deceleration_rate`
//! 2. **Integration**: `current` approaches `target` by at most
//!    `acceleration_step` (rising) or `braking_step` (falling) per tick.
//!
//! Stage 2 bounds `|Δspeed|` per tick no matter how hard the pedals jump.
//! Speeds are signed percentages; negative means reverse.

use crate::app::ports::ActuatorChannel;
use crate::config::{DriveConfig, MAX_DUTY};
use crate::drivers::motor::{self, Direction, MotorSweep, MotorWiring};
use crate::error::ConfigError;

use super::transmission::Transmission;

pub struct DriveController {
    max_speed: f32,
    brake_rate: f32,
    deceleration_rate: f32,
    acceleration_step: f32,
    braking_step: f32,
    wiring: MotorWiring,

    current_speed: f32,
    target_speed: f32,
    throttle: f32,
    brake: f32,
}

/// Sanitise a pedal position into `[0, 1]`.  NaN reads as released.
fn pedal(amount: f32) -> f32 {
    if amount.is_nan() { 0.0 } else { amount.clamp(0.0, 1.0) }
}

/// Move `speed` toward zero by `amount` without crossing it.
fn toward_zero(speed: f32, amount: f32) -> f32 {
    if speed >= 0.0 {
        (speed - amount).max(0.0)
    } else {
        (speed + amount).min(0.0)
    }
}

/// `|speed| / 100 * 4095`, truncated.
pub fn duty_for_speed(speed: f32) -> u16 {
    ((speed.abs().min(100.0) / 100.0) * f32::from(MAX_DUTY)) as u16
}

impl DriveController {
    pub fn new(config: &DriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_speed: config.max_speed,
            brake_rate: config.brake_rate,
            deceleration_rate: config.deceleration_rate,
            acceleration_step: config.acceleration_step,
            braking_step: config.braking_step,
            wiring: config.wiring.clone(),
            current_speed: 0.0,
            target_speed: 0.0,
            throttle: 0.0,
            brake: 0.0,
        })
    }

    /// Latch both pedal positions, each clamped to `[0, 1]`.
    pub fn set_target_from_input(&mut self, accel: f32, brake: f32) {
        self.throttle = pedal(accel);
        self.brake = pedal(brake);
    }

    pub fn accelerate(&mut self, amount: f32) {
        self.throttle = pedal(amount);
    }

    pub fn brake(&mut self, amount: f32) {
        self.brake = pedal(amount);
    }

    pub fn release_pedals(&mut self) {
        self.throttle = 0.0;
        self.brake = 0.0;
    }

    /// Advance one tick.  A non-positive or non-finite `dt_secs` (stalled
    /// or reset clock) leaves the state untouched.  Steps are per tick.
    pub fn tick(&mut self, dt_secs: f32, transmission: &Transmission) -> f32 {
        if !(dt_secs.is_finite() && dt_secs > 0.0) {
            return self.current_speed;
        }
        let limit = transmission.speed_limit(self.max_speed);
        self.target_speed = self.compute_target(transmission.acceleration_rate(), limit);
        self.current_speed = self.approach(self.target_speed);
        self.current_speed
    }

    fn compute_target(&self, acceleration_rate: f32, limit: f32) -> f32 {
        let current = self.current_speed;
        if self.throttle > 0.0 {
            (current + self.throttle * acceleration_rate).min(limit)
        } else if self.brake > 0.0 {
            toward_zero(current, self.brake * self.brake_rate)
        } else {
            toward_zero(current, self.deceleration_rate)
        }
    }

    fn approach(&self, target: f32) -> f32 {
        let current = self.current_speed;
        let delta = target - current;
        if delta > 0.0 {
            current + delta.min(self.acceleration_step)
        } else if delta < 0.0 {
            current - (-delta).min(self.braking_step)
        } else {
            current
        }
    }

    /// Low-level actuation: jump straight to `speed` (clamped to ±100) and
    /// write the motor pattern.  The new speed is recorded even if some
    /// channels failed; the next tick re-asserts the full pattern.
    pub fn set_speed<A: ActuatorChannel + ?Sized>(&mut self, speed: f32, out: &mut A) -> MotorSweep {
        let speed = if speed.is_nan() { 0.0 } else { speed.clamp(-100.0, 100.0) };
        self.current_speed = speed;
        self.target_speed = speed;
        self.actuate(out)
    }

    /// Write the pattern for the current speed.  Zero speed sweeps every
    /// motor channel to 0.
    pub fn actuate<A: ActuatorChannel + ?Sized>(&self, out: &mut A) -> MotorSweep {
        if self.current_speed == 0.0 {
            motor::stop(&self.wiring, out)
        } else {
            motor::drive(
                &self.wiring,
                out,
                Direction::from_speed(self.current_speed),
                duty_for_speed(self.current_speed),
            )
        }
    }

    /// Hard-clamp current and target magnitude to `limit`, keeping sign.
    /// Returns `true` if the current speed changed.
    pub fn clamp_to(&mut self, limit: f32) -> bool {
        let before = self.current_speed;
        self.current_speed = self.current_speed.clamp(-limit, limit);
        self.target_speed = self.target_speed.clamp(-limit, limit);
        self.current_speed != before
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn direction(&self) -> Direction {
        Direction::from_speed(self.current_speed)
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn wiring(&self) -> &MotorWiring {
        &self.wiring
    }
}
