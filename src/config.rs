//! Vehicle configuration parameters
//!
//! Every calibration constant and tunable for the JetCar control core.
//! Configuration is static: it is loaded once at boot (defaults or a JSON
//! document) and validated before anything touches the hardware.  Invalid
//! values are a fatal [`ConfigError`]; nothing here clamps silently.

use heapless::Vec;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::drivers::motor::MotorWiring;
use crate::error::ConfigError;

/// Upper bound on gear table length.
pub const MAX_GEARS: usize = 8;

/// Channels per PWM chip.
pub const PWM_CHANNELS: u8 = 16;

/// Full-scale 12-bit PWM duty value.
pub const MAX_DUTY: u16 = 4095;

/// Top-level vehicle configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub steering: SteeringConfig,
    pub drive: DriveConfig,
    pub transmission: TransmissionConfig,
    pub speed_sensor: SpeedSensorConfig,
    pub battery: BatteryConfig,
    pub input: InputConfig,
    pub timing: TimingConfig,
}

impl VehicleConfig {
    /// Parse a JSON document (missing fields take their defaults) and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            warn!("config: parse failed: {}", e);
            ConfigError::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.  The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.steering.validate()?;
        self.drive.validate()?;
        self.transmission.validate()?;
        self.speed_sensor.validate()?;
        self.battery.validate()?;
        self.input.validate()?;
        self.timing.validate()
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

// --- Steering ---

/// Servo calibration: three PWM points for full-left, centre, and full-right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Angle (degrees) that maps to the left/right calibration extremes.
    pub max_angle_deg: f32,
    pub left_pwm: u16,
    pub center_pwm: u16,
    pub right_pwm: u16,
    /// Servo channel on the steering PWM chip.
    pub channel: u8,
    pub pwm_frequency_hz: u16,
    /// Read back every register write and flag mismatches.
    pub verify_writes: bool,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_angle_deg: 180.0,
            left_pwm: 70,
            center_pwm: 320,
            right_pwm: 570,
            channel: 0,
            pwm_frequency_hz: 50,
            verify_writes: false,
        }
    }
}

impl SteeringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.max_angle_deg) {
            return Err(ConfigError::Invalid("steering.max_angle_deg"));
        }
        if !(self.left_pwm < self.center_pwm && self.center_pwm < self.right_pwm) {
            return Err(ConfigError::Invalid("steering calibration order (left < center < right)"));
        }
        if self.right_pwm > MAX_DUTY {
            return Err(ConfigError::Invalid("steering.right_pwm"));
        }
        if self.channel >= PWM_CHANNELS {
            return Err(ConfigError::Invalid("steering.channel"));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::Invalid("steering.pwm_frequency_hz"));
        }
        Ok(())
    }
}

// --- Drive ---

/// Pedal response and rate limits.  Rates and steps are per actuation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Absolute speed ceiling (percent) used in automatic mode.
    pub max_speed: f32,
    /// Target drop per tick at full brake.
    pub brake_rate: f32,
    /// Target drop per tick when coasting.
    pub deceleration_rate: f32,
    /// Largest per-tick increase of `current_speed`.
    pub acceleration_step: f32,
    /// Largest per-tick decrease of `current_speed`.
    pub braking_step: f32,
    pub pwm_frequency_hz: u16,
    pub verify_writes: bool,
    pub wiring: MotorWiring,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_speed: 100.0,
            brake_rate: 3.0,
            deceleration_rate: 1.0,
            acceleration_step: 5.0,
            braking_step: 5.0,
            pwm_frequency_hz: 60,
            verify_writes: false,
            wiring: MotorWiring::default(),
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.max_speed) || self.max_speed > 100.0 {
            return Err(ConfigError::Invalid("drive.max_speed"));
        }
        if !positive(self.brake_rate) {
            return Err(ConfigError::Invalid("drive.brake_rate"));
        }
        if !positive(self.deceleration_rate) {
            return Err(ConfigError::Invalid("drive.deceleration_rate"));
        }
        if !positive(self.acceleration_step) {
            return Err(ConfigError::Invalid("drive.acceleration_step"));
        }
        if !positive(self.braking_step) {
            return Err(ConfigError::Invalid("drive.braking_step"));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::Invalid("drive.pwm_frequency_hz"));
        }
        self.wiring.validate()
    }
}

// --- Transmission ---

/// One row of the gear table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GearSpec {
    /// Lower bound of the gear's band.  Only checked at load time (bands
    /// must be ordered); a gear change clamps to `max_speed` alone and
    /// never lifts a slow car up to this value.
    pub min_speed: f32,
    pub max_speed: f32,
    /// Multiplier applied to throttle when computing the target speed.
    pub acceleration_rate: f32,
}

impl GearSpec {
    pub const fn new(min_speed: f32, max_speed: f32, acceleration_rate: f32) -> Self {
        Self { min_speed, max_speed, acceleration_rate }
    }
}

/// Gear table plus the automatic shift schedule.
///
/// Shift thresholds are indexed by gear pair: entry `k` governs the
/// boundary between gear `k` and gear `k + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    pub gears: Vec<GearSpec, MAX_GEARS>,
    /// Upshift from gear `k` when speed rises above `upshift_above[k]`.
    pub upshift_above: Vec<f32, MAX_GEARS>,
    /// Downshift from gear `k + 1` when speed falls below `downshift_below[k]`.
    pub downshift_below: Vec<f32, MAX_GEARS>,
    /// Smallest allowed gap between paired up/down thresholds.
    pub min_hysteresis_gap: f32,
    /// Start in automatic mode.
    pub automatic: bool,
    pub initial_gear: usize,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            gears: [
                GearSpec::new(0.0, 25.0, 2.0),
                GearSpec::new(26.0, 50.0, 1.5),
                GearSpec::new(51.0, 75.0, 1.0),
                GearSpec::new(76.0, 100.0, 0.5),
            ]
            .into_iter()
            .collect(),
            upshift_above: [20.0, 45.0, 70.0].into_iter().collect(),
            downshift_below: [15.0, 40.0, 65.0].into_iter().collect(),
            min_hysteresis_gap: 5.0,
            automatic: false,
            initial_gear: 0,
        }
    }
}

impl TransmissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.gears.len();
        if count == 0 {
            return Err(ConfigError::Invalid("transmission.gears (empty)"));
        }

        for (gear, spec) in self.gears.iter().enumerate() {
            if !(spec.min_speed.is_finite() && spec.max_speed.is_finite()) {
                return Err(ConfigError::Gear { gear, reason: "speed bound not finite" });
            }
            if spec.min_speed < 0.0 || spec.max_speed > 100.0 || spec.min_speed > spec.max_speed {
                return Err(ConfigError::Gear { gear, reason: "speed range outside 0..=100 or inverted" });
            }
            if !positive(spec.acceleration_rate) {
                return Err(ConfigError::Gear { gear, reason: "acceleration rate must be positive" });
            }
        }

        if self.upshift_above.len() != count - 1 || self.downshift_below.len() != count - 1 {
            return Err(ConfigError::Invalid("transmission shift tables (need one entry per gear pair)"));
        }
        if !positive(self.min_hysteresis_gap) {
            return Err(ConfigError::Invalid("transmission.min_hysteresis_gap"));
        }

        for (pair, (&up, &down)) in self.upshift_above.iter().zip(&self.downshift_below).enumerate() {
            if !(up.is_finite() && down.is_finite()) {
                return Err(ConfigError::Gear { gear: pair, reason: "shift threshold not finite" });
            }
            if pair > 0 && up <= self.upshift_above[pair - 1] {
                return Err(ConfigError::Gear { gear: pair, reason: "upshift thresholds must strictly increase" });
            }
            if up - down < self.min_hysteresis_gap {
                return Err(ConfigError::Gear { gear: pair, reason: "downshift threshold inside hysteresis gap" });
            }
        }

        if self.initial_gear >= count {
            return Err(ConfigError::Gear { gear: self.initial_gear, reason: "initial gear outside table" });
        }
        Ok(())
    }
}

// --- Speed sensor ---

/// Wheel encoder geometry and sampling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSensorConfig {
    pub pulses_per_revolution: u32,
    pub wheel_diameter_m: f32,
    pub sample_window_ms: u32,
}

impl Default for SpeedSensorConfig {
    fn default() -> Self {
        Self {
            pulses_per_revolution: 36,
            wheel_diameter_m: 0.065,
            sample_window_ms: 1000,
        }
    }
}

impl SpeedSensorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulses_per_revolution == 0 {
            return Err(ConfigError::Invalid("speed_sensor.pulses_per_revolution"));
        }
        if !positive(self.wheel_diameter_m) {
            return Err(ConfigError::Invalid("speed_sensor.wheel_diameter_m"));
        }
        if self.sample_window_ms == 0 {
            return Err(ConfigError::Invalid("speed_sensor.sample_window_ms"));
        }
        Ok(())
    }
}

// --- Battery ---

/// 3S Li-ion pack: 9.0 V empty, 12.6 V full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Reads as 0 %.
    pub min_voltage: f32,
    /// Reads as 100 %.
    pub max_voltage: f32,
    /// Level boundaries: at or above `full_voltage` is Full, then Good
    /// down to `good_voltage`, Low down to `low_voltage`, Critical below.
    pub full_voltage: f32,
    pub good_voltage: f32,
    pub low_voltage: f32,
    /// ADC reference voltage at full-scale reading.
    pub adc_reference_v: f32,
    /// Resistive divider ratio between pack and ADC input.
    pub divider_ratio: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            min_voltage: 9.0,
            max_voltage: 12.6,
            full_voltage: 12.0,
            good_voltage: 11.1,
            low_voltage: 10.2,
            adc_reference_v: 3.3,
            divider_ratio: 17.0,
        }
    }
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_voltage.is_finite() && self.max_voltage.is_finite())
            || self.min_voltage >= self.max_voltage
        {
            return Err(ConfigError::Invalid("battery voltage window"));
        }
        let levels = [self.low_voltage, self.good_voltage, self.full_voltage];
        if !levels.iter().all(|v| v.is_finite()) || !(levels[0] < levels[1] && levels[1] < levels[2]) {
            return Err(ConfigError::Invalid("battery level thresholds"));
        }
        if !positive(self.adc_reference_v) || !positive(self.divider_ratio) {
            return Err(ConfigError::Invalid("battery ADC scaling"));
        }
        Ok(())
    }
}

// --- Input mapping ---

/// Axis and button ids as sent by the gamepad bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub steering_axis: u8,
    pub throttle_axis: u8,
    pub brake_axis: u8,
    pub shift_up_button: u8,
    pub shift_down_button: u8,
    pub toggle_mode_button: u8,
    pub stop_buttons: Vec<u8, 4>,
    pub shutdown_button: u8,
    /// Steering angle (degrees) produced by full stick deflection.
    pub steering_range_deg: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            steering_axis: 0,
            throttle_axis: 5,
            brake_axis: 2,
            shift_up_button: 5,
            shift_down_button: 4,
            toggle_mode_button: 3,
            stop_buttons: [6, 7].into_iter().collect(),
            shutdown_button: 8,
            steering_range_deg: 90.0,
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.steering_range_deg) {
            return Err(ConfigError::Invalid("input.steering_range_deg"));
        }
        Ok(())
    }
}

// --- Timing ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Actuation loop period (milliseconds)
    pub actuation_interval_ms: u32,
    /// Input poll period (milliseconds)
    pub input_poll_interval_ms: u32,
    /// Display refresh period (milliseconds)
    pub display_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            actuation_interval_ms: 50,  // 20 Hz
            input_poll_interval_ms: 10, // 100 Hz
            display_interval_ms: 500,   // 2 Hz
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actuation_interval_ms == 0 {
            return Err(ConfigError::Invalid("timing.actuation_interval_ms"));
        }
        if self.input_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("timing.input_poll_interval_ms"));
        }
        if self.display_interval_ms == 0 {
            return Err(ConfigError::Invalid("timing.display_interval_ms"));
        }
        Ok(())
    }
}
