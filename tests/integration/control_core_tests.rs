//! ControlCore against mock PWM banks: neutral sweeps, gear clamps,
//! steering retries and automatic shifting.

use jetcar::app::commands::VehicleCommand;
use jetcar::app::events::AppEvent;
use jetcar::app::service::ControlCore;
use jetcar::config::VehicleConfig;
use jetcar::control::drive::duty_for_speed;
use jetcar::control::steering::SteeringMapper;
use jetcar::control::transmission::TransmissionMode;
use jetcar::drivers::motor::Direction;
use jetcar::error::{ActuatorError, Error};

use crate::mock_hw::{MockChannel, RecordingSink};

fn core_with(config: &VehicleConfig) -> (ControlCore<MockChannel, MockChannel>, RecordingSink) {
    let core = ControlCore::new(config, MockChannel::new(), MockChannel::new()).unwrap();
    (core, RecordingSink::default())
}

fn started() -> (ControlCore<MockChannel, MockChannel>, RecordingSink) {
    let (mut core, mut sink) = core_with(&VehicleConfig::default());
    core.start(&mut sink).unwrap();
    core.motors_mut().clear();
    core.servo_mut().clear();
    sink.events.clear();
    (core, sink)
}

fn tick_n(core: &mut ControlCore<MockChannel, MockChannel>, sink: &mut RecordingSink, n: usize) {
    for _ in 0..n {
        core.tick(sink).unwrap();
    }
}

#[test]
fn start_drives_everything_to_neutral() {
    let (mut core, mut sink) = core_with(&VehicleConfig::default());
    core.start(&mut sink).unwrap();

    for ch in 0..9 {
        assert_eq!(core.motors().last_off(ch), Some(0), "motor ch{ch}");
    }
    assert_eq!(core.servo().last_off(0), Some(320));
    assert_eq!(
        sink.events,
        vec![AppEvent::Started { gear: 0, mode: TransmissionMode::Manual }]
    );
}

#[test]
fn zero_speed_sweep_survives_a_failing_channel() {
    let (mut core, mut sink) = started();
    core.motors_mut().failing.insert(2);

    let result = core.handle_command(VehicleCommand::SetSpeed(0.0), &mut sink);

    assert_eq!(result, Err(Error::Actuator(ActuatorError::BusWrite)));
    for ch in (0..9).filter(|&c| c != 2) {
        assert_eq!(core.motors().last_off(ch), Some(0), "motor ch{ch}");
    }
    assert_eq!(
        sink.events,
        vec![AppEvent::ActuatorFault { channel: 2, error: ActuatorError::BusWrite }]
    );
}

#[test]
fn throttle_ramps_up_to_first_gear_ceiling() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::Accelerate(1.0), &mut sink).unwrap();

    tick_n(&mut core, &mut sink, 5);
    assert_eq!(core.speed(), 10.0);

    tick_n(&mut core, &mut sink, 20);
    assert_eq!(core.speed(), 25.0);
    assert_eq!(core.direction(), Direction::Forward);
    assert_eq!(core.motors().last_off(0), Some(duty_for_speed(25.0)));
}

#[test]
fn downshift_clamps_speed_to_lower_gear() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::Accelerate(1.0), &mut sink).unwrap();
    tick_n(&mut core, &mut sink, 13);
    assert_eq!(core.speed(), 25.0);

    core.handle_command(VehicleCommand::ShiftUp, &mut sink).unwrap();
    assert_eq!(core.gear(), 1);
    tick_n(&mut core, &mut sink, 10);
    assert_eq!(core.speed(), 40.0);

    core.handle_command(VehicleCommand::ShiftDown, &mut sink).unwrap();
    assert_eq!(core.gear(), 0);
    assert_eq!(core.speed(), 25.0);
    assert!(core.target_speed() <= 25.0);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::GearChanged { from: 0, to: 1, mode: TransmissionMode::Manual },
            AppEvent::GearChanged { from: 1, to: 0, mode: TransmissionMode::Manual },
        ]
    );
}

#[test]
fn upshift_at_low_speed_keeps_current_speed() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::Accelerate(1.0), &mut sink).unwrap();
    tick_n(&mut core, &mut sink, 2);
    let slow = core.speed();
    assert!(slow > 0.0 && slow < 26.0, "{slow}");

    core.handle_command(VehicleCommand::ShiftUp, &mut sink).unwrap();
    assert_eq!(core.gear(), 1);
    // Second gear's band starts at 26; the car is not lifted to it.
    assert_eq!(core.speed(), slow);
}

#[test]
fn shifting_past_the_ends_is_silent() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::ShiftDown, &mut sink).unwrap();
    assert_eq!(core.gear(), 0);
    for _ in 0..10 {
        core.handle_command(VehicleCommand::ShiftUp, &mut sink).unwrap();
    }
    assert_eq!(core.gear(), 3);
    assert_eq!(sink.events.len(), 3);
}

#[test]
fn failed_steering_is_retried_on_next_tick() {
    let (mut core, mut sink) = started();
    core.servo_mut().offline = true;

    let result = core.handle_command(VehicleCommand::SetSteering(30.0), &mut sink);
    assert!(result.is_err());
    assert_eq!(core.steering_angle(), 0.0);
    assert!(matches!(sink.events[0], AppEvent::SteeringRejected { angle, .. } if angle == 30.0));

    core.servo_mut().offline = false;
    core.tick(&mut sink).unwrap();

    let expected = SteeringMapper::new(&VehicleConfig::default().steering)
        .unwrap()
        .angle_to_signal(30.0);
    assert_eq!(core.steering_angle(), 30.0);
    assert_eq!(core.servo().last_off(0), Some(expected));

    // Retry is one-shot: a later tick writes nothing new.
    core.servo_mut().clear();
    core.tick(&mut sink).unwrap();
    assert!(core.servo().writes.is_empty());
}

#[test]
fn automatic_mode_upshifts_past_threshold() {
    let mut config = VehicleConfig::default();
    config.transmission.automatic = true;
    let (mut core, mut sink) = core_with(&config);
    core.start(&mut sink).unwrap();
    sink.events.clear();

    core.handle_command(VehicleCommand::Accelerate(1.0), &mut sink).unwrap();
    tick_n(&mut core, &mut sink, 10);
    assert_eq!(core.speed(), 20.0);
    assert_eq!(core.gear(), 0);

    core.tick(&mut sink).unwrap();
    assert_eq!(core.gear(), 1);
    assert_eq!(
        sink.events,
        vec![AppEvent::GearChanged { from: 0, to: 1, mode: TransmissionMode::Automatic }]
    );
}

#[test]
fn toggling_mode_reports_without_jerking_speed() {
    let mut config = VehicleConfig::default();
    config.transmission.automatic = true;
    let (mut core, mut sink) = core_with(&config);
    core.start(&mut sink).unwrap();
    core.handle_command(VehicleCommand::SetSpeed(30.0), &mut sink).unwrap();
    sink.events.clear();

    core.handle_command(VehicleCommand::ToggleTransmissionMode, &mut sink).unwrap();
    assert_eq!(core.mode(), TransmissionMode::Manual);
    assert_eq!(core.speed(), 30.0);
    assert_eq!(sink.events, vec![AppEvent::ModeChanged(TransmissionMode::Manual)]);

    // Coasting brings it under the gear ceiling tick by tick.
    core.tick(&mut sink).unwrap();
    assert!(core.speed() < 30.0 && core.speed() >= 25.0);
}

#[test]
fn reverse_speed_uses_reverse_pattern() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::SetSpeed(-50.0), &mut sink).unwrap();

    let duty = duty_for_speed(-50.0);
    assert_eq!(core.direction(), Direction::Reverse);
    for ch in [0, 1, 6, 7] {
        assert_eq!(core.motors().last_off(ch), Some(duty), "motor ch{ch}");
    }
    for ch in [2, 5] {
        assert_eq!(core.motors().last_off(ch), Some(0), "motor ch{ch}");
    }
}

#[test]
fn stop_cuts_motors_and_releases_pedals() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::Accelerate(1.0), &mut sink).unwrap();
    tick_n(&mut core, &mut sink, 5);

    core.handle_command(VehicleCommand::Stop, &mut sink).unwrap();
    assert_eq!(core.speed(), 0.0);
    for ch in 0..9 {
        assert_eq!(core.motors().last_off(ch), Some(0));
    }

    tick_n(&mut core, &mut sink, 3);
    assert_eq!(core.speed(), 0.0);
}

#[test]
fn neutralize_reports_incomplete_then_releases() {
    let (mut core, mut sink) = started();
    core.handle_command(VehicleCommand::SetSpeed(40.0), &mut sink).unwrap();
    core.motors_mut().failing.insert(7);
    sink.events.clear();

    assert!(core.neutralize(&mut sink).is_err());
    assert_eq!(sink.events.last(), Some(&AppEvent::Neutralized { complete: false }));

    let (servo, motors) = core.release();
    assert_eq!(servo.last_off(0), Some(320));
    assert_eq!(motors.last_off(0), Some(0));
}
