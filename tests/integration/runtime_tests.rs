//! VehicleRuntime end to end: threads, command queue, input routing,
//! display refresh and the shutdown sequence.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use jetcar::adapters::time::MonotonicClock;
use jetcar::app::events::{ControlStatus, StatusSnapshot};
use jetcar::app::service::ControlCore;
use jetcar::config::VehicleConfig;
use jetcar::error::{InputError, SensorError};
use jetcar::input::InputEvent;
use jetcar::runtime::{COMMAND_DEPTH, CommandSender, IoParts, VehicleRuntime};
use jetcar::sensors::speed::{PulseCounter, SpeedEstimator};

use crate::mock_hw::{ChannelRenderer, FixedBattery, MockChannel, RecordingSink, ScriptedInput};

type TestRuntime = VehicleRuntime<MockChannel, MockChannel, RecordingSink>;

fn fast_config() -> VehicleConfig {
    let mut config = VehicleConfig::default();
    config.timing.actuation_interval_ms = 5;
    config.timing.input_poll_interval_ms = 1;
    config.timing.display_interval_ms = 5;
    config
}

fn spawn(input: ScriptedInput, battery: FixedBattery) -> (TestRuntime, Receiver<StatusSnapshot>) {
    let config = fast_config();
    let core = ControlCore::new(&config, MockChannel::new(), MockChannel::new()).unwrap();
    let counter: &'static PulseCounter = Box::leak(Box::new(PulseCounter::new()));
    let clock = MonotonicClock::new();
    let estimator = SpeedEstimator::new(counter, &config.speed_sensor, clock.uptime_ms()).unwrap();
    let (tx, rx) = mpsc::channel();
    let io = IoParts {
        input,
        renderer: ChannelRenderer(tx),
        battery,
        estimator,
        clock,
    };
    let runtime = VehicleRuntime::spawn(&config, core, RecordingSink::default(), io).unwrap();
    (runtime, rx)
}

fn wait_for(sender: &CommandSender, what: &str, pred: impl Fn(&ControlStatus) -> bool) -> ControlStatus {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let status = sender.status();
        if pred(&status) {
            return status;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}: {status:?}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn direct_commands_reach_the_actuation_loop() {
    let (runtime, _rx) = spawn(ScriptedInput::idle(), FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    sender.accelerate(1.0).unwrap();
    wait_for(&sender, "speed", |s| s.speed_percent >= 10.0);
    sender.shift_up().unwrap();
    wait_for(&sender, "gear 2", |s| s.gear == 1);

    let released = runtime.shutdown().unwrap();
    assert!(released.neutral_complete);
    for ch in 0..9 {
        assert_eq!(released.motors.last_off(ch), Some(0), "motor ch{ch}");
    }
    assert_eq!(released.servo.last_off(0), Some(320));
}

#[test]
fn steering_axis_is_routed_to_the_servo() {
    let input = ScriptedInput::new([Ok(InputEvent::Axis { id: 0, value: 0.5 })]);
    let (runtime, _rx) = spawn(input, FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    wait_for(&sender, "steering", |s| s.steering_angle == 45.0);

    let released = runtime.shutdown().unwrap();
    // Neutral steering is the last servo write.
    assert_eq!(released.servo.last_off(0), Some(320));
}

#[test]
fn malformed_input_is_skipped() {
    let input = ScriptedInput::new([
        Err(InputError::Malformed),
        Ok(InputEvent::Button { id: 5, pressed: true }),
    ]);
    let (runtime, _rx) = spawn(input, FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    wait_for(&sender, "shift up", |s| s.gear == 1);
    runtime.shutdown().unwrap();
}

#[test]
fn shutdown_button_raises_request() {
    let input = ScriptedInput::new([Ok(InputEvent::Button { id: 8, pressed: true })]);
    let (runtime, _rx) = spawn(input, FixedBattery(Ok(12.0)));

    let deadline = Instant::now() + Duration::from_secs(3);
    while !runtime.shutdown_requested() {
        assert!(Instant::now() < deadline, "shutdown request never arrived");
        std::thread::sleep(Duration::from_millis(2));
    }
    // Already raised: returns immediately.
    runtime.wait_for_shutdown_request();
    assert!(runtime.shutdown_requested());
    assert!(runtime.shutdown().unwrap().neutral_complete);
}

#[test]
fn lost_input_stops_car_but_direct_control_remains() {
    let input = ScriptedInput::new([Ok(InputEvent::Axis { id: 5, value: 1.0 })]).then_disconnect();
    let (runtime, _rx) = spawn(input, FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    std::thread::sleep(Duration::from_millis(50));
    wait_for(&sender, "stop after disconnect", |s| s.speed_percent == 0.0);

    sender.accelerate(0.5).unwrap();
    wait_for(&sender, "direct throttle", |s| s.speed_percent > 0.0);
    runtime.shutdown().unwrap();
}

#[test]
fn lost_input_after_throttle_burst_still_stops() {
    let burst = (0..20).map(|_| Ok(InputEvent::Axis { id: 5, value: 1.0 }));
    let (runtime, _rx) = spawn(ScriptedInput::new(burst).then_disconnect(), FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    wait_for(&sender, "stop after disconnect", |s| s.speed_percent == 0.0 && s.target_percent == 0.0);
    // The throttle latched before the loss must not come back.
    std::thread::sleep(Duration::from_millis(100));
    let status = sender.status();
    assert_eq!(status.speed_percent, 0.0, "{status:?}");
    assert_eq!(status.target_percent, 0.0, "{status:?}");
    runtime.shutdown().unwrap();
}

#[test]
fn shift_press_survives_axis_burst() {
    let mut script: Vec<_> = (0..40)
        .flat_map(|i| {
            let v = i as f32 / 40.0;
            [Ok(InputEvent::Axis { id: 0, value: v }), Ok(InputEvent::Axis { id: 2, value: 0.0 })]
        })
        .collect();
    script.push(Ok(InputEvent::Button { id: 5, pressed: true }));
    let (runtime, _rx) = spawn(ScriptedInput::new(script), FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    wait_for(&sender, "shift after burst", |s| s.gear == 1);
    runtime.shutdown().unwrap();
}

#[test]
fn press_burst_beyond_queue_depth_is_not_dropped() {
    // Shift-downs in first gear are no-ops; the final shift-up must land.
    let mut script: Vec<_> = (0..COMMAND_DEPTH + 8)
        .map(|_| Ok(InputEvent::Button { id: 4, pressed: true }))
        .collect();
    script.push(Ok(InputEvent::Button { id: 5, pressed: true }));
    let (runtime, _rx) = spawn(ScriptedInput::new(script), FixedBattery(Ok(12.0)));
    let sender = runtime.commands();

    wait_for(&sender, "shift after press burst", |s| s.gear == 1);
    runtime.shutdown().unwrap();
}

#[test]
fn display_combines_status_and_battery() {
    let (runtime, rx) = spawn(ScriptedInput::idle(), FixedBattery(Ok(10.8)));

    let snapshot = rx.recv_timeout(Duration::from_secs(3)).unwrap();
    assert_eq!(snapshot.battery_percent, Some(50));
    assert_eq!(snapshot.gear, 0);
    assert_eq!(snapshot.speed_kmh, 0.0);
    runtime.shutdown().unwrap();
}

#[test]
fn unreadable_battery_renders_as_unknown() {
    let (runtime, rx) = spawn(ScriptedInput::idle(), FixedBattery(Err(SensorError::BusRead)));

    let snapshot = rx.recv_timeout(Duration::from_secs(3)).unwrap();
    assert_eq!(snapshot.battery_percent, None);
    assert!(snapshot.to_string().ends_with("bat --"));
    runtime.shutdown().unwrap();
}
