//! Control core: the hexagonal core.
//!
//! [`ControlCore`] owns the vehicle state (speed, steering angle, gear,
//! transmission mode) and the two PWM banks it drives.  Exactly one task
//! owns it; everybody else talks to it through
//! [`VehicleCommand`]s.  All I/O flows through port traits, making the
//! whole core testable with mock channels.
//!
//! ```text
//!  VehicleCommand ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                     │          ControlCore          │
//!     servo bank  ◀── │ Steering · Transmission · Drive│ ──▶ motor bank
//!                     └──────────────────────────────┘
//! ```
//!
//! The tick is the unit of fault isolation: a failed write is reported,
//! logged, and re-asserted next tick.  Nothing here panics.

use log::{info, warn};

use crate::config::VehicleConfig;
use crate::control::drive::DriveController;
use crate::control::steering::SteeringMapper;
use crate::control::transmission::{Transmission, TransmissionMode};
use crate::drivers::motor::{Direction, MotorSweep};
use crate::error::{ConfigError, Error, Result};

use super::commands::VehicleCommand;
use super::events::{AppEvent, ControlStatus};
use super::ports::{ActuatorChannel, EventSink};

// ───────────────────────────────────────────────────────────────
// ControlCore
// ───────────────────────────────────────────────────────────────

pub struct ControlCore<S, M> {
    steering: SteeringMapper,
    transmission: Transmission,
    drive: DriveController,
    servo: S,
    motors: M,
    /// Steering request not yet reflected by the servo (last write failed).
    pending_angle: Option<f32>,
    /// Seconds per actuation tick (derived from config).
    tick_secs: f32,
    tick_count: u64,
}

impl<S: ActuatorChannel, M: ActuatorChannel> ControlCore<S, M> {
    /// Validate the whole configuration and build the core around the
    /// servo and motor channel banks.  Nothing is written yet; call
    /// [`start`](Self::start) to drive the outputs to neutral.
    pub fn new(config: &VehicleConfig, servo: S, motors: M) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            steering: SteeringMapper::new(&config.steering)?,
            transmission: Transmission::new(&config.transmission)?,
            drive: DriveController::new(&config.drive)?,
            servo,
            motors,
            pending_angle: None,
            tick_secs: config.timing.actuation_interval_ms as f32 / 1000.0,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive everything to neutral and announce the initial gear.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<()> {
        let result = self.neutral_outputs(sink);
        sink.emit(&AppEvent::Started {
            gear: self.transmission.gear(),
            mode: self.transmission.mode(),
        });
        info!(
            "ControlCore started in gear {} ({:?})",
            self.transmission.gear() + 1,
            self.transmission.mode()
        );
        result
    }

    /// Final neutral actuation: `set_speed(0)` then steering to 0.  Both
    /// are attempted even if the first fails.
    pub fn neutralize(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.drive.release_pedals();
        let result = self.neutral_outputs(sink);
        sink.emit(&AppEvent::Neutralized { complete: result.is_ok() });
        match result {
            Ok(()) => info!("ControlCore neutralized"),
            Err(e) => warn!("ControlCore neutralized with faults: {}", e),
        }
        result
    }

    /// Give back the channel banks.  Only reachable by value, so callers
    /// neutralize first and release after.
    pub fn release(self) -> (S, M) {
        (self.servo, self.motors)
    }

    fn neutral_outputs(&mut self, sink: &mut impl EventSink) -> Result<()> {
        let sweep = self.drive.set_speed(0.0, &mut self.motors);
        let motors = self.report_sweep(&sweep, sink);
        let steering = self.steer(0.0, sink);
        motors.and(steering)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Apply one command.  Errors are already reported through `sink`;
    /// the returned error is for the caller's logs.
    pub fn handle_command(&mut self, command: VehicleCommand, sink: &mut impl EventSink) -> Result<()> {
        match command {
            VehicleCommand::SetSteering(angle) => self.steer(angle, sink),
            VehicleCommand::SetSpeed(speed) => {
                let sweep = self.drive.set_speed(speed, &mut self.motors);
                self.report_sweep(&sweep, sink)
            }
            VehicleCommand::Accelerate(amount) => {
                self.drive.accelerate(amount);
                Ok(())
            }
            VehicleCommand::Brake(amount) => {
                self.drive.brake(amount);
                Ok(())
            }
            VehicleCommand::ShiftUp => {
                let from = self.transmission.gear();
                if self.transmission.shift_up() {
                    self.on_gear_change(from, sink);
                }
                Ok(())
            }
            VehicleCommand::ShiftDown => {
                let from = self.transmission.gear();
                if self.transmission.shift_down() {
                    self.on_gear_change(from, sink);
                }
                Ok(())
            }
            VehicleCommand::ToggleTransmissionMode => {
                let mode = self.transmission.toggle_mode();
                // Gear is unchanged, so no hard clamp: in manual mode the
                // gear ceiling caps the target and ticks ramp down to it.
                sink.emit(&AppEvent::ModeChanged(mode));
                Ok(())
            }
            VehicleCommand::Stop => {
                self.drive.release_pedals();
                let sweep = self.drive.set_speed(0.0, &mut self.motors);
                info!("DRIVE | stop");
                self.report_sweep(&sweep, sink)
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One actuation cycle: integrate speed → automatic shift → write
    /// motors → retry a pending steering write.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.tick_count += 1;

        let speed = self.drive.tick(self.tick_secs, &self.transmission);
        let from = self.transmission.gear();
        if self.transmission.update_automatic(speed) {
            self.on_gear_change(from, sink);
        }

        let sweep = self.drive.actuate(&mut self.motors);
        let motors = self.report_sweep(&sweep, sink);

        let steering = match self.pending_angle {
            Some(angle) => self.steer(angle, sink),
            None => Ok(()),
        };
        motors.and(steering)
    }

    fn steer(&mut self, angle: f32, sink: &mut impl EventSink) -> Result<()> {
        match self.steering.apply(angle, &mut self.servo) {
            Ok(_) => {
                self.pending_angle = None;
                Ok(())
            }
            Err(error) => {
                // Keep the request so the next tick re-asserts it.
                self.pending_angle = Some(angle);
                sink.emit(&AppEvent::SteeringRejected { angle, error });
                Err(Error::Actuator(error))
            }
        }
    }

    fn on_gear_change(&mut self, from: usize, sink: &mut impl EventSink) {
        let to = self.transmission.gear();
        sink.emit(&AppEvent::GearChanged { from, to, mode: self.transmission.mode() });
        self.clamp_to_limit();
    }

    fn clamp_to_limit(&mut self) {
        let limit = self.transmission.speed_limit(self.drive.max_speed());
        if self.drive.clamp_to(limit) {
            info!("DRIVE | speed clamped to {:.0}% for gear {}", limit, self.transmission.gear() + 1);
        }
    }

    fn report_sweep(&self, sweep: &MotorSweep, sink: &mut impl EventSink) -> Result<()> {
        for &(channel, error) in &sweep.failed {
            sink.emit(&AppEvent::ActuatorFault { channel, error });
        }
        match sweep.failed.first() {
            Some(&(_, error)) => Err(Error::Actuator(error)),
            None => Ok(()),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            speed_percent: self.drive.current_speed(),
            target_percent: self.drive.target_speed(),
            steering_angle: self.steering.current_angle(),
            gear: self.transmission.gear(),
            mode: self.transmission.mode(),
            direction: self.drive.direction(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.drive.current_speed()
    }

    pub fn target_speed(&self) -> f32 {
        self.drive.target_speed()
    }

    pub fn direction(&self) -> Direction {
        self.drive.direction()
    }

    pub fn steering_angle(&self) -> f32 {
        self.steering.current_angle()
    }

    pub fn gear(&self) -> usize {
        self.transmission.gear()
    }

    pub fn mode(&self) -> TransmissionMode {
        self.transmission.mode()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Steering servo channel bank (tests inspect mocks through this).
    pub fn servo(&self) -> &S {
        &self.servo
    }

    pub fn servo_mut(&mut self) -> &mut S {
        &mut self.servo
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut M {
        &mut self.motors
    }
}
