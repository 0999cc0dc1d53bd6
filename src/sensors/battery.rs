//! Battery state-of-charge estimate.
//!
//! Linear between the configured empty and full voltages.  Good enough
//! for a dashboard gauge; the pack's discharge curve is flat in the middle.

use crate::config::BatteryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Full,
    Good,
    Low,
    Critical,
}

impl BatteryLevel {
    /// Classify a pack voltage against the configured thresholds.
    pub fn from_voltage(volts: f32, config: &BatteryConfig) -> Self {
        if volts >= config.full_voltage {
            Self::Full
        } else if volts >= config.good_voltage {
            Self::Good
        } else if volts >= config.low_voltage {
            Self::Low
        } else {
            Self::Critical
        }
    }
}

/// Percentage of charge, rounded and clamped to 0–100.
pub fn percent(volts: f32, config: &BatteryConfig) -> u8 {
    if !volts.is_finite() {
        return 0;
    }
    let span = config.max_voltage - config.min_voltage;
    let pct = (volts - config.min_voltage) / span * 100.0;
    pct.clamp(0.0, 100.0).round() as u8
}

/// Pack voltage from a raw 16-bit ADC reading behind the resistive divider.
pub fn voltage_from_raw(raw: u16, config: &BatteryConfig) -> f32 {
    f32::from(raw) * config.adc_reference_v / 65535.0 * config.divider_ratio
}
