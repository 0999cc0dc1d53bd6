//! Wheel-encoder speed estimator.
//!
//! The encoder produces `pulses_per_revolution` edges per wheel turn.  A
//! GPIO ISR bumps an atomic counter on each rising edge; once per sampling
//! window the estimator swaps the counter to zero and converts the pulses
//! into road speed:
//!
//! ```text
//!   revolutions = pulses / pulses_per_revolution
//!   distance_m  = revolutions * wheel_diameter_m * π
//!   speed_kmh   = distance_m / dt * 3.6
//! ```
//!
//! The ISR and the display task run on different cores, so the counter is
//! an `AtomicU32`: `fetch_add` on the producer side, `swap(0)` on the
//! consumer side.  A pulse landing between the swap and the next window is
//! simply counted in that next window.

use core::f32::consts::PI;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::SpeedSensorConfig;
use crate::error::ConfigError;

/// Lock-free pulse counter shared between an interrupt and one sampler.
#[derive(Debug, Default)]
pub struct PulseCounter(AtomicU32);

impl PulseCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Producer side.  Safe to call from interrupt context.
    #[inline]
    pub fn record_pulse(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Consumer side: read and reset in one atomic step.
    pub fn take(&self) -> u32 {
        self.0.swap(0, Ordering::Relaxed)
    }

    /// Current count without resetting.
    pub fn peek(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counter fed by the wheel-encoder GPIO ISR.
/// `static` because ESP-IDF ISR callbacks cannot capture closures.
pub static WHEEL_PULSES: PulseCounter = PulseCounter::new();

/// Called from the GPIO ISR on each encoder rising edge.
pub fn wheel_isr_handler() {
    WHEEL_PULSES.record_pulse();
}

/// Result of one sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// Pulses counted in the window.
    pub pulse_count: u32,
    /// Window length in seconds.
    pub elapsed_secs: f32,
    pub speed_kmh: f32,
}

pub struct SpeedEstimator {
    counter: &'static PulseCounter,
    pulses_per_revolution: f32,
    wheel_circumference_m: f32,
    window_ms: u64,
    window_start_ms: u64,
    last: Option<SpeedSample>,
}

impl SpeedEstimator {
    /// `now_ms` opens the first sampling window.
    pub fn new(
        counter: &'static PulseCounter,
        config: &SpeedSensorConfig,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            counter,
            pulses_per_revolution: config.pulses_per_revolution as f32,
            wheel_circumference_m: config.wheel_diameter_m * PI,
            window_ms: u64::from(config.sample_window_ms),
            window_start_ms: now_ms,
            last: None,
        })
    }

    /// Convert a pulse count over `dt_secs` to km/h.  `None` for `dt <= 0`.
    pub fn speed_kmh(&self, pulses: u32, dt_secs: f32) -> Option<f32> {
        if !(dt_secs.is_finite() && dt_secs > 0.0) {
            return None;
        }
        let revolutions = pulses as f32 / self.pulses_per_revolution;
        let distance_m = revolutions * self.wheel_circumference_m;
        Some(distance_m / dt_secs * 3.6)
    }

    /// Take the pulses accumulated so far and convert them over `dt_secs`.
    ///
    /// With a non-positive `dt` nothing is sampled and the counter keeps
    /// its pulses for the next call.
    pub fn sample(&mut self, dt_secs: f32) -> Option<SpeedSample> {
        if !(dt_secs.is_finite() && dt_secs > 0.0) {
            return None;
        }
        let pulse_count = self.counter.take();
        let speed_kmh = self.speed_kmh(pulse_count, dt_secs)?;
        let sample = SpeedSample { pulse_count, elapsed_secs: dt_secs, speed_kmh };
        self.last = Some(sample);
        Some(sample)
    }

    /// Sample if the current window has elapsed at `now_ms`, then open the
    /// next window.  Returns the fresh sample, if any.
    pub fn poll(&mut self, now_ms: u64) -> Option<SpeedSample> {
        let elapsed_ms = now_ms.saturating_sub(self.window_start_ms);
        if elapsed_ms < self.window_ms {
            return None;
        }
        let sample = self.sample(elapsed_ms as f32 / 1000.0)?;
        self.window_start_ms = now_ms;
        Some(sample)
    }

    /// Most recent sample (held between windows for display).
    pub fn last(&self) -> Option<SpeedSample> {
        self.last
    }

    pub fn last_speed_kmh(&self) -> f32 {
        self.last.map_or(0.0, |s| s.speed_kmh)
    }
}
