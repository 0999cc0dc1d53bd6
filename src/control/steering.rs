//! Steering servo mapping.
//!
//! Converts a steering angle to a servo PWM duty value by piecewise-linear
//! interpolation between three calibration points:
//!
//! ```text
//!   -max_angle ──▶ left_pwm
//!            0 ──▶ center_pwm
//!   +max_angle ──▶ right_pwm
//! ```
//!
//! The result is truncated toward zero, matching how the servo was
//! calibrated on the bench.

use crate::app::ports::ActuatorChannel;
use crate::config::SteeringConfig;
use crate::error::{ActuatorError, ConfigError};

pub struct SteeringMapper {
    max_angle: f32,
    left: u16,
    center: u16,
    right: u16,
    channel: u8,
    current_angle: f32,
}

impl SteeringMapper {
    pub fn new(config: &SteeringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_angle: config.max_angle_deg,
            left: config.left_pwm,
            center: config.center_pwm,
            right: config.right_pwm,
            channel: config.channel,
            current_angle: 0.0,
        })
    }

    /// Pure mapping: angle (clamped to ±max) → duty value.
    pub fn angle_to_signal(&self, angle: f32) -> u16 {
        // NaN would otherwise poison the interpolation; treat it as centred.
        let angle = if angle.is_nan() { 0.0 } else { angle.clamp(-self.max_angle, self.max_angle) };
        let center = f32::from(self.center);
        let fraction = angle / self.max_angle;

        let signal = if angle < 0.0 {
            center + fraction * (center - f32::from(self.left))
        } else if angle > 0.0 {
            center + fraction * (f32::from(self.right) - center)
        } else {
            return self.center;
        };
        signal as u16
    }

    /// Steer to `angle` on `out`.  `current_angle` only moves when the
    /// servo write succeeds; a failed write keeps the old angle.
    pub fn apply<A: ActuatorChannel + ?Sized>(
        &mut self,
        angle: f32,
        out: &mut A,
    ) -> Result<u16, ActuatorError> {
        let angle = if angle.is_nan() { 0.0 } else { angle.clamp(-self.max_angle, self.max_angle) };
        let signal = self.angle_to_signal(angle);
        out.set_duty(self.channel, signal)?;
        self.current_angle = angle;
        Ok(signal)
    }

    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneShot {
        fail: bool,
        last: Option<(u8, u16)>,
    }

    impl ActuatorChannel for OneShot {
        fn set(&mut self, channel: u8, _on: u16, off: u16) -> Result<(), ActuatorError> {
            if self.fail {
                return Err(ActuatorError::BusWrite);
            }
            self.last = Some((channel, off));
            Ok(())
        }
    }

    fn mapper() -> SteeringMapper {
        SteeringMapper::new(&SteeringConfig::default()).unwrap()
    }

    #[test]
    fn zero_maps_to_center_exactly() {
        assert_eq!(mapper().angle_to_signal(0.0), 320);
        assert_eq!(mapper().angle_to_signal(-0.0), 320);
    }

    #[test]
    fn extremes_map_to_calibration_points() {
        let m = mapper();
        assert_eq!(m.angle_to_signal(-180.0), 70);
        assert_eq!(m.angle_to_signal(180.0), 570);
    }

    #[test]
    fn half_deflection_interpolates() {
        let m = mapper();
        assert_eq!(m.angle_to_signal(-90.0), 195);
        assert_eq!(m.angle_to_signal(90.0), 445);
    }

    #[test]
    fn fractional_result_truncates() {
        // 320 + (1/180) * 250 = 321.38…
        assert_eq!(mapper().angle_to_signal(1.0), 321);
    }

    #[test]
    fn input_beyond_max_is_clamped() {
        let m = mapper();
        assert_eq!(m.angle_to_signal(720.0), 570);
        assert_eq!(m.angle_to_signal(-720.0), 70);
    }

    #[test]
    fn apply_writes_servo_channel_and_tracks_angle() {
        let mut m = mapper();
        let mut out = OneShot { fail: false, last: None };
        assert_eq!(m.apply(90.0, &mut out), Ok(445));
        assert_eq!(out.last, Some((0, 445)));
        assert_eq!(m.current_angle(), 90.0);
    }

    #[test]
    fn failed_write_keeps_previous_angle() {
        let mut m = mapper();
        let mut out = OneShot { fail: false, last: None };
        m.apply(30.0, &mut out).unwrap();

        out.fail = true;
        assert_eq!(m.apply(-45.0, &mut out), Err(ActuatorError::BusWrite));
        assert_eq!(m.current_angle(), 30.0);
    }

    #[test]
    fn invalid_calibration_is_rejected() {
        let cfg = SteeringConfig { center_pwm: 600, ..SteeringConfig::default() };
        assert!(SteeringMapper::new(&cfg).is_err());
    }
}
