//! The three loops of the vehicle runtime.

use std::sync::Arc;
use std::time::Duration;

use async_io_mini::Timer;
use log::{debug, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::app::commands::VehicleCommand;
use crate::app::events::StatusSnapshot;
use crate::app::ports::{ActuatorChannel, BatteryPort, EventSink, InputSource, StatusRenderer};
use crate::app::service::ControlCore;
use crate::config::BatteryConfig;
use crate::input::{InputRouter, Routed};
use crate::sensors::battery::{self, BatteryLevel};
use crate::sensors::speed::SpeedEstimator;

use super::channels::{Shared, StopSignal};

/// Upper bound on events handled per input poll, so a chatty source
/// cannot starve the display task.
const MAX_EVENTS_PER_POLL: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

/// Sleep one period, or wake early when `stop` is raised.
async fn pause(stop: &StopSignal, period: Duration) -> Step {
    futures_lite::future::or(
        async {
            stop.wait().await;
            Step::Stop
        },
        async {
            Timer::after(period).await;
            Step::Continue
        },
    )
    .await
}

// ── Actuation ─────────────────────────────────────────────────

/// Sole owner of the control core while the runtime is up.  Hands it back
/// (with the sink) when stopped so the caller can neutralize.
pub(super) async fn actuation_loop<S, M, E>(
    mut core: ControlCore<S, M>,
    mut sink: E,
    shared: Arc<Shared>,
    period: Duration,
) -> (ControlCore<S, M>, E)
where
    S: ActuatorChannel,
    M: ActuatorChannel,
    E: EventSink,
{
    info!("ACT | loop started ({}ms)", period.as_millis());
    loop {
        for command in shared.take_pending() {
            if let Err(e) = core.handle_command(command, &mut sink) {
                debug!("ACT | {:?}: {}", command, e);
            }
        }

        if let Err(e) = core.tick(&mut sink) {
            debug!("ACT | tick {}: {}", core.tick_count(), e);
        }
        shared.publish(core.status());

        if pause(&shared.stop_actuation, period).await == Step::Stop {
            break;
        }
    }
    info!("ACT | loop stopped after {} ticks", core.tick_count());
    (core, sink)
}

// ── Input ─────────────────────────────────────────────────────

pub(super) struct InputTask<I> {
    pub source: I,
    pub router: InputRouter,
    pub shared: Arc<Shared>,
    pub period: Duration,
}

/// Outcome of one input poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drain {
    /// Source idle or poll budget spent; poll again next period.
    Open,
    /// Source gone for good.
    Closed,
    /// Runtime stopping.
    Stopped,
}

impl<I: InputSource> InputTask<I> {
    pub async fn run(mut self) {
        let mut enabled = true;
        loop {
            if enabled {
                match self.drain().await {
                    Drain::Open => {}
                    Drain::Closed => enabled = false,
                    Drain::Stopped => break,
                }
            }
            if pause(&self.shared.stop_input, self.period).await == Step::Stop {
                break;
            }
        }
        info!("INPUT | task stopped");
    }

    /// Handle pending events.
    async fn drain(&mut self) -> Drain {
        for _ in 0..MAX_EVENTS_PER_POLL {
            match self.source.poll_event() {
                Ok(Some(event)) => match self.router.route(&event) {
                    Some(Routed::Command(command)) => {
                        if self.forward(command).await == Step::Stop {
                            return Drain::Stopped;
                        }
                    }
                    Some(Routed::Shutdown) => {
                        info!("INPUT | shutdown requested");
                        self.shared.shutdown_requested.signal(());
                    }
                    None => {}
                },
                Ok(None) => return Drain::Open,
                Err(e) if e.is_recoverable() => warn!("INPUT | {}, skipped", e),
                Err(e) => {
                    // Nobody is holding the pedals any more.
                    warn!("INPUT | {}; input control disabled, direct control remains", e);
                    self.shared.latch(VehicleCommand::Stop);
                    return Drain::Closed;
                }
            }
        }
        Drain::Open
    }

    /// Hand a routed command to the actuation loop.  A press waits for
    /// queue room, or gives up when the runtime stops.
    async fn forward(&self, command: VehicleCommand) -> Step {
        if self.shared.latch(command) {
            return Step::Continue;
        }
        futures_lite::future::or(
            async {
                self.shared.commands.send(command).await;
                Step::Continue
            },
            async {
                self.shared.stop_input.wait().await;
                Step::Stop
            },
        )
        .await
    }
}

// ── Display ───────────────────────────────────────────────────

pub(super) struct DisplayTask<R, B> {
    pub renderer: R,
    pub battery: B,
    pub battery_config: BatteryConfig,
    pub estimator: SpeedEstimator,
    pub clock: MonotonicClock,
    pub shared: Arc<Shared>,
    pub period: Duration,
}

impl<R: StatusRenderer, B: BatteryPort> DisplayTask<R, B> {
    pub async fn run(mut self) {
        let mut battery_ok = true;
        let mut level = BatteryLevel::Full;
        loop {
            self.estimator.poll(self.clock.uptime_ms());

            let battery_percent = match self.battery.read_voltage() {
                Ok(volts) => {
                    battery_ok = true;
                    let now = BatteryLevel::from_voltage(volts, &self.battery_config);
                    if now != level {
                        info!("STATUS | battery {:?} ({:.2} V)", now, volts);
                        level = now;
                    }
                    Some(battery::percent(volts, &self.battery_config))
                }
                Err(e) => {
                    if battery_ok {
                        warn!("STATUS | battery unreadable: {}", e);
                        battery_ok = false;
                    }
                    None
                }
            };

            let status = self.shared.status();
            self.renderer.render(&StatusSnapshot {
                speed_kmh: self.estimator.last_speed_kmh(),
                gear: status.gear,
                mode: status.mode,
                direction: status.direction,
                battery_percent,
            });

            if pause(&self.shared.stop_display, self.period).await == Step::Stop {
                break;
            }
        }
        info!("STATUS | task stopped");
    }
}
