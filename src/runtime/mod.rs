//! Vehicle runtime: the actuation loop plus the cooperative IO executor.
//!
//! ```text
//! APP core  ── actuation thread ── block_on(actuation_loop) ── owns ControlCore
//! PRO core  ── io thread ── LocalExecutor ─┬─ input_loop   (InputSource → commands)
//!                                          └─ display_loop (estimator, battery → renderer)
//! ```
//!
//! Shutdown order is fixed: stop the loops, join both threads, take the
//! control core back from the actuation thread, neutralize, then release
//! the channel banks.  Ownership makes any other order unrepresentable.

pub mod channels;
mod tasks;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info, warn};

use crate::adapters::time::MonotonicClock;
use crate::app::ports::{ActuatorChannel, BatteryPort, EventSink, InputSource, StatusRenderer};
use crate::app::service::ControlCore;
use crate::config::VehicleConfig;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::{Error, Result};
use crate::input::InputRouter;
use crate::sensors::speed::SpeedEstimator;

pub use channels::{COMMAND_DEPTH, CommandSender, Shared};

use tasks::{DisplayTask, InputTask};

/// Everything the IO thread owns.
pub struct IoParts<I, R, B> {
    pub input: I,
    pub renderer: R,
    pub battery: B,
    pub estimator: SpeedEstimator,
    pub clock: MonotonicClock,
}

/// What comes back from a completed shutdown.
pub struct Released<S, M> {
    pub servo: S,
    pub motors: M,
    /// `false` when any neutralizing write failed.
    pub neutral_complete: bool,
}

pub struct VehicleRuntime<S, M, E> {
    shared: Arc<Shared>,
    actuation: JoinHandle<(ControlCore<S, M>, E)>,
    io: JoinHandle<()>,
}

impl<S, M, E> VehicleRuntime<S, M, E>
where
    S: ActuatorChannel + Send + 'static,
    M: ActuatorChannel + Send + 'static,
    E: EventSink + Send + 'static,
{
    /// Drive the outputs to neutral, then start the actuation and IO
    /// threads.  If the IO thread cannot be spawned the actuation thread
    /// is stopped and the core neutralized before returning the error.
    pub fn spawn<I, R, B>(
        config: &VehicleConfig,
        mut core: ControlCore<S, M>,
        mut sink: E,
        io: IoParts<I, R, B>,
    ) -> Result<Self>
    where
        I: InputSource + Send + 'static,
        R: StatusRenderer + Send + 'static,
        B: BatteryPort + Send + 'static,
    {
        let router = InputRouter::new(config.input.clone())?;
        let timing = config.timing;
        let battery_config = config.battery;

        if let Err(e) = core.start(&mut sink) {
            // Level-triggered outputs: the first tick re-asserts them.
            warn!("RUNTIME | initial neutral incomplete: {}", e);
        }

        let shared = Arc::new(Shared::new());
        shared.publish(core.status());

        let actuation_shared = Arc::clone(&shared);
        let period = Duration::from_millis(u64::from(timing.actuation_interval_ms));
        let actuation = spawn_on_core(Core::App, 20, 12, "actuation\0", move || {
            futures_lite::future::block_on(tasks::actuation_loop(core, sink, actuation_shared, period))
        })
        .map_err(|e| {
            error!("RUNTIME | actuation spawn failed: {}", e);
            Error::Init("actuation thread spawn failed")
        })?;

        let input = InputTask {
            source: io.input,
            router,
            shared: Arc::clone(&shared),
            period: Duration::from_millis(u64::from(timing.input_poll_interval_ms)),
        };
        let display = DisplayTask {
            renderer: io.renderer,
            battery: io.battery,
            battery_config,
            estimator: io.estimator,
            clock: io.clock,
            shared: Arc::clone(&shared),
            period: Duration::from_millis(u64::from(timing.display_interval_ms)),
        };
        let io = match spawn_on_core(Core::Pro, 10, 16, "vehicle-io\0", move || run_io(input, display)) {
            Ok(handle) => handle,
            Err(e) => {
                error!("RUNTIME | io spawn failed: {}", e);
                shared.stop_actuation.signal(());
                if let Ok((mut core, mut sink)) = actuation.join() {
                    let _ = core.neutralize(&mut sink);
                }
                return Err(Error::Init("io thread spawn failed"));
            }
        };

        info!("RUNTIME | started (tick={}ms)", timing.actuation_interval_ms);
        Ok(Self { shared, actuation, io })
    }

    /// Direct control handle; keeps working after the input source fails.
    pub fn commands(&self) -> CommandSender {
        CommandSender::new(Arc::clone(&self.shared))
    }

    /// `true` once the operator pressed the shutdown button.
    pub fn shutdown_requested(&self) -> bool {
        self.shared.shutdown_requested.signaled()
    }

    /// Block the calling thread until the operator asks to shut down.
    pub fn wait_for_shutdown_request(&self) {
        futures_lite::future::block_on(self.shared.shutdown_requested.wait());
        // Leave the flag raised for `shutdown_requested()`.
        self.shared.shutdown_requested.signal(());
    }

    pub fn shutdown(self) -> Result<Released<S, M>> {
        info!("RUNTIME | shutdown requested");
        self.shared.stop_input.signal(());
        self.shared.stop_display.signal(());
        self.shared.stop_actuation.signal(());

        let io_result = self.io.join();
        let (mut core, mut sink) = self.actuation.join().map_err(|_| {
            error!("RUNTIME | actuation thread panicked; outputs left as-is");
            Error::Init("actuation thread panicked")
        })?;

        let neutral_complete = core.neutralize(&mut sink).is_ok();
        let (servo, motors) = core.release();
        info!("RUNTIME | outputs released (neutral_complete={})", neutral_complete);

        if io_result.is_err() {
            error!("RUNTIME | io thread panicked");
            return Err(Error::Init("io thread panicked"));
        }
        Ok(Released { servo, motors, neutral_complete })
    }
}

fn run_io<I, R, B>(input: InputTask<I>, display: DisplayTask<R, B>)
where
    I: InputSource,
    R: StatusRenderer,
    B: BatteryPort,
{
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    let input = executor.spawn(input.run());
    let display = executor.spawn(display.run());

    futures_lite::future::block_on(executor.run(async move {
        input.await;
        display.await;
    }));
    info!("IO | executor finished");
}
