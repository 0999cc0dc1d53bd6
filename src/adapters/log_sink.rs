//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { gear, mode } => {
                info!("START | gear={} mode={:?}", gear + 1, mode);
            }
            AppEvent::GearChanged { from, to, mode } => {
                info!("GEAR | {} -> {} ({:?})", from + 1, to + 1, mode);
            }
            AppEvent::ModeChanged(mode) => {
                info!("GEAR | mode={:?}", mode);
            }
            AppEvent::ActuatorFault { channel, error } => {
                warn!("FAULT | motor ch{}: {}", channel, error);
            }
            AppEvent::SteeringRejected { angle, error } => {
                warn!("FAULT | steering {:.1}\u{00b0} rejected: {}", angle, error);
            }
            AppEvent::Neutralized { complete } => {
                if *complete {
                    info!("DRIVE | neutral");
                } else {
                    warn!("DRIVE | neutral incomplete");
                }
            }
        }
    }
}
