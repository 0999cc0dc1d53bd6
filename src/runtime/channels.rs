//! Inter-task communication for the vehicle runtime.
//!
//! Uses `embassy-sync` primitives to bridge the IO thread (input and
//! display tasks) with the actuation thread.  One [`Shared`] block per
//! runtime, behind an `Arc`, so several runtimes can coexist in tests.
//!
//! ```text
//! ┌──────────────┐ VehicleCommand ┌──────────────────┐
//! │  Input task  │──────────────▶│  Actuation loop   │
//! └──────────────┘                │  (owns VehicleState)
//! ┌──────────────┐ ControlStatus  │                  │
//! │ Display task │◀──────────────│                  │
//! └──────────────┘                └──────────────────┘
//! ```
//!
//! Commands travel three ways.  `Stop` raises a signal that is never
//! lost.  Axis setters overwrite a latest-wins slot each.  Only discrete
//! presses (shifts, mode toggle) take the bounded queue, where the input
//! task waits for room instead of dropping them.

use core::cell::Cell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;

use crate::app::commands::VehicleCommand;
use crate::app::events::ControlStatus;

/// Channel depth for discrete commands (shifts, mode toggle).  Axis
/// setters and `Stop` never go through the queue.
pub const COMMAND_DEPTH: usize = 16;

pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Latest-wins slots for the level-triggered setters.  A newer value
/// replaces an unapplied older one.
#[derive(Debug, Clone, Copy, Default)]
struct Levels {
    speed: Option<f32>,
    throttle: Option<f32>,
    brake: Option<f32>,
    steering: Option<f32>,
}

pub struct Shared {
    /// Discrete commands: input task / direct API → actuation loop.
    pub(super) commands: Channel<CriticalSectionRawMutex, VehicleCommand, COMMAND_DEPTH>,
    levels: Mutex<CriticalSectionRawMutex, Cell<Levels>>,
    /// Raised by every `Stop`; applied before anything else each tick.
    stop_requested: StopSignal,
    /// Latest status published by the actuation loop.
    status: Mutex<CriticalSectionRawMutex, Cell<ControlStatus>>,
    pub(super) stop_actuation: StopSignal,
    pub(super) stop_input: StopSignal,
    pub(super) stop_display: StopSignal,
    /// Raised by the input task when the operator asks to shut down.
    pub(super) shutdown_requested: StopSignal,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            commands: Channel::new(),
            levels: Mutex::new(Cell::new(Levels::default())),
            stop_requested: Signal::new(),
            status: Mutex::new(Cell::new(ControlStatus::default())),
            stop_actuation: Signal::new(),
            stop_input: Signal::new(),
            stop_display: Signal::new(),
            shutdown_requested: Signal::new(),
        }
    }

    pub fn publish(&self, status: ControlStatus) {
        self.status.lock(|cell| cell.set(status));
    }

    pub fn status(&self) -> ControlStatus {
        self.status.lock(Cell::get)
    }

    /// Store a level setter or raise `Stop`.  Returns `false` for the
    /// discrete commands that have to be queued.
    pub(super) fn latch(&self, command: VehicleCommand) -> bool {
        match command {
            VehicleCommand::Stop => {
                // Pedal and speed requests older than the stop are void.
                self.levels.lock(|cell| {
                    let mut levels = cell.get();
                    levels.speed = None;
                    levels.throttle = None;
                    levels.brake = None;
                    cell.set(levels);
                });
                self.stop_requested.signal(());
            }
            VehicleCommand::SetSpeed(v) => self.update_levels(|l| l.speed = Some(v)),
            VehicleCommand::Accelerate(v) => self.update_levels(|l| l.throttle = Some(v)),
            VehicleCommand::Brake(v) => self.update_levels(|l| l.brake = Some(v)),
            VehicleCommand::SetSteering(v) => self.update_levels(|l| l.steering = Some(v)),
            VehicleCommand::ShiftUp | VehicleCommand::ShiftDown | VehicleCommand::ToggleTransmissionMode => {
                return false;
            }
        }
        true
    }

    fn update_levels(&self, f: impl FnOnce(&mut Levels)) {
        self.levels.lock(|cell| {
            let mut levels = cell.get();
            f(&mut levels);
            cell.set(levels);
        });
    }

    /// Send a command without blocking.  Only a discrete command can be
    /// refused, when the queue is full.
    pub fn send(&self, command: VehicleCommand) -> Result<(), VehicleCommand> {
        if self.latch(command) {
            return Ok(());
        }
        self.commands.try_send(command).map_err(|_| {
            warn!("RUNTIME | command queue full, dropping {:?}", command);
            command
        })
    }

    /// Everything pending for the actuation loop, in application order:
    /// a raised stop first, then the level setters, then the queue.
    pub(super) fn take_pending(&self) -> impl Iterator<Item = VehicleCommand> + '_ {
        let stop = self.stop_requested.try_take().map(|()| VehicleCommand::Stop);
        let levels = self.levels.lock(Cell::take);
        let latched = [
            stop,
            levels.speed.map(VehicleCommand::SetSpeed),
            levels.throttle.map(VehicleCommand::Accelerate),
            levels.brake.map(VehicleCommand::Brake),
            levels.steering.map(VehicleCommand::SetSteering),
        ];
        latched
            .into_iter()
            .flatten()
            .chain(core::iter::from_fn(move || self.commands.try_receive().ok()))
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Direct API handle onto a running vehicle.  Works whether or not the
/// input task is alive.
#[derive(Clone)]
pub struct CommandSender {
    shared: Arc<Shared>,
}

impl CommandSender {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn send(&self, command: VehicleCommand) -> Result<(), VehicleCommand> {
        self.shared.send(command)
    }

    pub fn set_steering(&self, angle: f32) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::SetSteering(angle))
    }

    pub fn set_speed(&self, percent: f32) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::SetSpeed(percent))
    }

    pub fn accelerate(&self, amount: f32) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::Accelerate(amount))
    }

    pub fn brake(&self, amount: f32) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::Brake(amount))
    }

    pub fn shift_up(&self) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::ShiftUp)
    }

    pub fn shift_down(&self) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::ShiftDown)
    }

    pub fn toggle_transmission_mode(&self) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::ToggleTransmissionMode)
    }

    pub fn stop(&self) -> Result<(), VehicleCommand> {
        self.send(VehicleCommand::Stop)
    }

    /// Latest status published by the actuation loop.
    pub fn status(&self) -> ControlStatus {
        self.shared.status()
    }
}
