//! One I²C bus, several chips, several threads.
//!
//! The servo PWM chip, the motor PWM chip and the battery ADC all hang off
//! the same two wires.  The actuation thread owns the two PWM drivers and
//! the IO thread owns the battery monitor, so each driver gets a
//! [`SharedBus`] handle that locks the underlying bus for the length of
//! one transaction.

use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::i2c::{ErrorType, I2c, Operation};

pub struct SharedBus<I2C> {
    bus: Arc<Mutex<I2C>>,
}

impl<I2C> SharedBus<I2C> {
    pub fn new(bus: I2C) -> Self {
        Self { bus: Arc::new(Mutex::new(bus)) }
    }

    /// Another handle onto the same bus.
    pub fn handle(&self) -> Self {
        Self { bus: Arc::clone(&self.bus) }
    }

    /// Number of live handles (including this one).
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.bus)
    }

    /// Recover the bus once every other handle has been dropped.
    pub fn into_inner(self) -> Result<I2C, Self> {
        Arc::try_unwrap(self.bus)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|bus| Self { bus })
    }
}

impl<I2C: ErrorType> ErrorType for SharedBus<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> I2c for SharedBus<I2C> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // A thread that panicked mid-transaction leaves the bus usable; the
        // chip sees at worst a truncated frame, which the next write fixes.
        let mut bus = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        bus.transaction(address, operations)
    }
}
