//! JetCar firmware library.
//!
//! Exposes the control, input and runtime modules for integration
//! testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod input;
pub mod pins;
pub mod runtime;
pub mod sensors;
