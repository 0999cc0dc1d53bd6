//! JetCar firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Pca9685 ×2        BatteryMonitor   LineInput   LogRenderer  │
//! │  (ActuatorChannel) (BatteryPort)    (Input)     (Status)     │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │        ControlCore (steering · gearbox · drive)    │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  VehicleRuntime: actuation thread (APP) · IO executor (PRO)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use jetcar::adapters::line_input::LineInput;
use jetcar::adapters::log_renderer::LogStatusRenderer;
use jetcar::adapters::log_sink::LogEventSink;
use jetcar::adapters::time::MonotonicClock;
use jetcar::app::service::ControlCore;
use jetcar::config::VehicleConfig;
use jetcar::drivers::battery_monitor::BatteryMonitor;
use jetcar::drivers::hw_init;
use jetcar::drivers::pca9685::Pca9685;
use jetcar::drivers::shared_bus::SharedBus;
use jetcar::pins;
use jetcar::runtime::{IoParts, VehicleRuntime};
use jetcar::sensors::speed::{SpeedEstimator, WHEEL_PULSES};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  JetCar v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = VehicleConfig::default();
    config.validate().map_err(|e| anyhow!("config: {e}"))?;

    // ── 3. I²C bus and chips ──────────────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: pin numbers come from `pins` and are not claimed elsewhere.
    let (sda, scl) = unsafe { (AnyIOPin::new(pins::I2C_SDA_GPIO), AnyIOPin::new(pins::I2C_SCL_GPIO)) };
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;
    let bus = SharedBus::new(i2c);

    let mut delay = FreeRtos;
    let mut servo = Pca9685::new(bus.handle(), pins::SERVO_PWM_ADDR)
        .with_verification(config.steering.verify_writes);
    servo
        .init(config.steering.pwm_frequency_hz, &mut delay)
        .map_err(|e| anyhow!("servo PWM init: {e}"))?;
    let mut motors = Pca9685::new(bus.handle(), pins::MOTOR_PWM_ADDR)
        .with_verification(config.drive.verify_writes);
    motors
        .init(config.drive.pwm_frequency_hz, &mut delay)
        .map_err(|e| anyhow!("motor PWM init: {e}"))?;
    let battery = BatteryMonitor::new(bus.handle(), pins::BATTERY_ADC_ADDR, config.battery);

    // ── 4. Wheel encoder ──────────────────────────────────────
    if let Err(e) = hw_init::init_wheel_encoder() {
        // Speed readout only; driving does not depend on it.
        warn!("wheel encoder unavailable: {}", e);
    }
    let clock = MonotonicClock::new();
    let estimator = SpeedEstimator::new(&WHEEL_PULSES, &config.speed_sensor, clock.uptime_ms())
        .map_err(|e| anyhow!("speed sensor: {e}"))?;

    // ── 5. Control core and runtime ───────────────────────────
    let core = ControlCore::new(&config, servo, motors).map_err(|e| anyhow!("control core: {e}"))?;
    let input = LineInput::spawn(std::io::stdin()).map_err(|e| anyhow!("{e}"))?;
    let io = IoParts {
        input,
        renderer: LogStatusRenderer::new(),
        battery,
        estimator,
        clock,
    };
    let runtime = VehicleRuntime::spawn(&config, core, LogEventSink::new(), io)
        .map_err(|e| anyhow!("runtime: {e}"))?;

    // ── 6. Run until the operator asks to stop ────────────────
    runtime.wait_for_shutdown_request();

    let released = runtime.shutdown().map_err(|e| anyhow!("shutdown: {e}"))?;
    if !released.neutral_complete {
        error!("outputs may not be neutral");
    }
    hw_init::release_wheel_encoder();
    drop((released.servo, released.motors));
    info!("JetCar stopped (bus handles left: {})", bus.handle_count());
    Ok(())
}
