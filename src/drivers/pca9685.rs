//! PCA9685 16-channel 12-bit PWM controller over I²C.
//!
//! The JetCar carries two of these: one drives the steering servo, the
//! other the rear motor H-bridges.  Each channel has four registers
//! starting at `LED0_ON_L + 4 * channel`:
//!
//! ```text
//!   +0 ON_L   +1 ON_H   +2 OFF_L   +3 OFF_H
//! ```
//!
//! With MODE1 auto-increment set, a channel is updated by one 5-byte write
//! (register address followed by the four bytes).
//!
//! Generic over [`embedded_hal::i2c::I2c`] so the same driver runs on the
//! ESP-IDF I²C master and on a mock bus in host tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info};

use crate::app::ports::ActuatorChannel;
use crate::config::{MAX_DUTY, PWM_CHANNELS};
use crate::error::ActuatorError;

// ── Registers ─────────────────────────────────────────────────

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const LED0_ON_L: u8 = 0x06;
pub const PRE_SCALE: u8 = 0xFE;

const MODE1_SLEEP: u8 = 0x10;
const MODE1_RESTART_AI_ALLCALL: u8 = 0xA1;
const MODE2_OUTDRV: u8 = 0x04;

/// Internal oscillator frequency.
const OSC_HZ: f32 = 25_000_000.0;

/// PRE_SCALE value for an output frequency: `floor(25 MHz / 4096 / f − 1)`,
/// limited to the chip's accepted 3..=255.
pub fn prescale_for(freq_hz: u16) -> u8 {
    let raw = (OSC_HZ / 4096.0 / f32::from(freq_hz.max(1)) - 1.0).floor();
    raw.clamp(3.0, 255.0) as u8
}

/// Register address of a channel's ON_L byte.
pub const fn channel_register(channel: u8) -> u8 {
    LED0_ON_L + 4 * channel
}

pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
    verify_writes: bool,
}

impl<I2C: I2c> Pca9685<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address, verify_writes: false }
    }

    /// Read back every channel write and report mismatches.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_writes = verify;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Configure the output frequency and enable auto-increment.
    ///
    /// PRE_SCALE is only writable while the oscillator sleeps, so: sleep,
    /// write prescale, restore MODE1, wait for the oscillator, restart.
    pub fn init(&mut self, freq_hz: u16, delay: &mut impl DelayNs) -> Result<(), ActuatorError> {
        self.write_register(MODE2, MODE2_OUTDRV)?;
        let old_mode = self.read_register(MODE1)?;
        let prescale = prescale_for(freq_hz);

        self.write_register(MODE1, (old_mode & 0x7F) | MODE1_SLEEP)?;
        self.write_register(PRE_SCALE, prescale)?;
        self.write_register(MODE1, old_mode)?;
        delay.delay_ms(5);
        self.write_register(MODE1, old_mode | MODE1_RESTART_AI_ALLCALL)?;

        info!(
            "pca9685@0x{:02x}: {} Hz (prescale={})",
            self.address, freq_hz, prescale
        );
        Ok(())
    }

    /// Hand the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ActuatorError> {
        self.i2c.write(self.address, &[register, value]).map_err(|e| {
            debug!("pca9685@0x{:02x}: write reg 0x{:02x}: {:?}", self.address, register, e.kind());
            ActuatorError::BusWrite
        })
    }

    fn read_register(&mut self, register: u8) -> Result<u8, ActuatorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| {
                debug!("pca9685@0x{:02x}: read reg 0x{:02x}: {:?}", self.address, register, e.kind());
                ActuatorError::BusRead
            })?;
        Ok(buf[0])
    }
}

impl<I2C: I2c> ActuatorChannel for Pca9685<I2C> {
    fn set(&mut self, channel: u8, on_time: u16, off_time: u16) -> Result<(), ActuatorError> {
        if channel >= PWM_CHANNELS {
            return Err(ActuatorError::ChannelOutOfRange(channel));
        }
        let on = on_time.min(MAX_DUTY).to_le_bytes();
        let off = off_time.min(MAX_DUTY).to_le_bytes();
        let register = channel_register(channel);
        let frame = [register, on[0], on[1], off[0], off[1]];

        self.i2c.write(self.address, &frame).map_err(|e| {
            debug!("pca9685@0x{:02x}: ch{} write: {:?}", self.address, channel, e.kind());
            ActuatorError::BusWrite
        })?;

        if self.verify_writes {
            let mut readback = [0u8; 4];
            self.i2c
                .write_read(self.address, &[register], &mut readback)
                .map_err(|_| ActuatorError::BusRead)?;
            if readback != frame[1..] {
                return Err(ActuatorError::VerifyMismatch { channel });
            }
        }
        Ok(())
    }
}
