//! PCA9685 and battery ADC drivers against a register-file mock bus.

use embedded_hal::delay::DelayNs;
use jetcar::app::ports::{ActuatorChannel, BatteryPort};
use jetcar::config::BatteryConfig;
use jetcar::drivers::battery_monitor::BatteryMonitor;
use jetcar::drivers::pca9685::{LED0_ON_L, MODE1, MODE2, PRE_SCALE, Pca9685, prescale_for};
use jetcar::drivers::shared_bus::SharedBus;
use jetcar::error::{ActuatorError, SensorError};
use jetcar::sensors::battery;

use crate::mock_hw::MockI2c;

#[derive(Default)]
struct CountingDelay {
    total_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[test]
fn init_sets_prescale_while_asleep_then_restarts() {
    let mut pwm = Pca9685::new(MockI2c::new(0x40), 0x40);
    let mut delay = CountingDelay::default();
    pwm.init(50, &mut delay).unwrap();
    let bus = pwm.release();

    assert_eq!(
        bus.writes,
        vec![
            vec![MODE2, 0x04],
            vec![MODE1],
            vec![MODE1, 0x10],
            vec![PRE_SCALE, prescale_for(50)],
            vec![MODE1, 0x00],
            vec![MODE1, 0xA1],
        ]
    );
    assert_eq!(bus.registers[PRE_SCALE as usize], 0x79);
    assert!(delay.total_ns >= 5_000_000);
}

#[test]
fn init_reports_dead_bus() {
    let mut bus = MockI2c::new(0x40);
    bus.fail_writes = true;
    let mut pwm = Pca9685::new(bus, 0x40);
    assert_eq!(pwm.init(60, &mut CountingDelay::default()), Err(ActuatorError::BusWrite));
}

#[test]
fn channel_write_is_one_five_byte_frame() {
    let mut pwm = Pca9685::new(MockI2c::new(0x60), 0x60);
    pwm.set(3, 0, 0x0ABC).unwrap();
    pwm.set_duty(4, 9999).unwrap();
    let bus = pwm.release();

    assert_eq!(bus.writes[0], vec![LED0_ON_L + 12, 0x00, 0x00, 0xBC, 0x0A]);
    // Duty clamps to 4095.
    assert_eq!(bus.writes[1], vec![LED0_ON_L + 16, 0x00, 0x00, 0xFF, 0x0F]);
}

#[test]
fn channel_out_of_range_never_reaches_bus() {
    let mut pwm = Pca9685::new(MockI2c::new(0x60), 0x60);
    assert_eq!(pwm.set(16, 0, 100), Err(ActuatorError::ChannelOutOfRange(16)));
    assert!(pwm.release().writes.is_empty());
}

#[test]
fn verification_catches_stuck_register() {
    let mut bus = MockI2c::new(0x40);
    // OFF_L of channel 3.
    bus.stuck.insert(LED0_ON_L + 12 + 2);
    let mut pwm = Pca9685::new(bus, 0x40).with_verification(true);

    assert_eq!(pwm.set(2, 0, 300), Ok(()));
    assert_eq!(pwm.set(3, 0, 300), Err(ActuatorError::VerifyMismatch { channel: 3 }));
}

#[test]
fn wrong_address_is_a_write_error() {
    let mut pwm = Pca9685::new(MockI2c::new(0x40), 0x41);
    assert_eq!(pwm.set_duty(0, 1), Err(ActuatorError::BusWrite));
}

#[test]
fn two_chips_share_one_bus() {
    let bus = SharedBus::new(MockI2c::new(0x40));
    let mut a = Pca9685::new(bus.handle(), 0x40);
    let mut b = Pca9685::new(bus.handle(), 0x40);
    assert_eq!(bus.handle_count(), 3);

    a.set_duty(0, 100).unwrap();
    b.set_duty(1, 200).unwrap();
    drop((a, b));

    let mock = bus.into_inner().ok().unwrap();
    assert_eq!(mock.writes.len(), 2);
}

#[test]
fn shared_bus_stays_locked_while_handles_live() {
    let bus = SharedBus::new(MockI2c::new(0x40));
    let _handle = bus.handle();
    assert!(bus.into_inner().is_err());
}

#[test]
fn battery_monitor_reads_big_endian_conversion() {
    let config = BatteryConfig::default();
    let mut adc = MockI2c::new(0x41);
    adc.registers[0] = 0x80;
    adc.registers[1] = 0x00;
    let mut monitor = BatteryMonitor::new(adc, 0x41, config);

    assert_eq!(monitor.read_raw(), Ok(0x8000));
    assert_eq!(monitor.read_voltage(), Ok(battery::voltage_from_raw(0x8000, &config)));
}

#[test]
fn battery_monitor_maps_bus_failure() {
    let mut adc = MockI2c::new(0x41);
    adc.fail_reads = true;
    let mut monitor = BatteryMonitor::new(adc, 0x41, BatteryConfig::default());
    assert_eq!(monitor.read_voltage(), Err(SensorError::BusRead));
}
