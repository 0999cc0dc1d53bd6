//! Sensor math: wheel-speed estimation and battery charge.

pub mod battery;
pub mod speed;
