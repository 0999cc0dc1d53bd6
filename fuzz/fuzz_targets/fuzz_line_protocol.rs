//! Fuzz target: `parse_line` followed by `InputRouter::route`
//!
//! Feeds arbitrary text from the gamepad bridge through the parser and
//! the default mapping, and asserts that every routed command carries a
//! finite, in-range value.
//!
//! cargo fuzz run fuzz_line_protocol

#![no_main]

use jetcar::app::commands::VehicleCommand;
use jetcar::config::InputConfig;
use jetcar::input::line_protocol::parse_line;
use jetcar::input::{InputRouter, Routed};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let mapping = InputConfig::default();
    let range = mapping.steering_range_deg;
    let Ok(router) = InputRouter::new(mapping) else {
        return;
    };

    for line in text.lines() {
        let Ok(Some(event)) = parse_line(line) else {
            continue;
        };
        match router.route(&event) {
            Some(Routed::Command(VehicleCommand::SetSteering(angle))) => {
                assert!(angle.is_finite() && angle.abs() <= range);
            }
            Some(Routed::Command(VehicleCommand::Accelerate(v) | VehicleCommand::Brake(v))) => {
                assert!((0.0..=1.0).contains(&v));
            }
            _ => {}
        }
    }
});
