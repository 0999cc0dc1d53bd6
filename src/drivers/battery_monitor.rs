//! Battery voltage monitor: a 16-bit I²C ADC behind a resistive divider.
//!
//! Conversion register 0 holds the latest reading, big-endian.

use embedded_hal::i2c::{Error as _, I2c};
use log::debug;

use crate::app::ports::BatteryPort;
use crate::config::BatteryConfig;
use crate::error::SensorError;
use crate::sensors::battery;

const CONVERSION_REGISTER: u8 = 0x00;

pub struct BatteryMonitor<I2C> {
    i2c: I2C,
    address: u8,
    config: BatteryConfig,
}

impl<I2C: I2c> BatteryMonitor<I2C> {
    pub fn new(i2c: I2C, address: u8, config: BatteryConfig) -> Self {
        Self { i2c, address, config }
    }

    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[CONVERSION_REGISTER], &mut buf)
            .map_err(|e| {
                debug!("battery@0x{:02x}: read: {:?}", self.address, e.kind());
                SensorError::BusRead
            })?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> BatteryPort for BatteryMonitor<I2C> {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_raw()?;
        Ok(battery::voltage_from_raw(raw, &self.config))
    }
}
