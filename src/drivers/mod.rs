//! Chip drivers, hardware initialisation, and peripheral helpers.

pub mod battery_monitor;
pub mod hw_init;
pub mod motor;
pub mod pca9685;
pub mod shared_bus;
pub mod task_pin;
