//! Application core: vehicle state and command handling, zero direct I/O.
//!
//! [`service::ControlCore`] combines steering, transmission and drive
//! control.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
