//! GPIO / bus assignments for the JetCar ESP32-S3 controller board.
//!
//! Single source of truth. Drivers and `main()` reference this module
//! rather than hard-coding pin numbers or I²C addresses.

// ---------------------------------------------------------------------------
// I²C bus (PWM chips + battery ADC)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Bus clock.  All three chips are fast-mode capable.
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

/// PCA9685 driving the steering servo.
pub const SERVO_PWM_ADDR: u8 = 0x40;
/// PCA9685 driving the rear motor H-bridges.
pub const MOTOR_PWM_ADDR: u8 = 0x60;
/// 16-bit ADC measuring pack voltage through the divider.
pub const BATTERY_ADC_ADDR: u8 = 0x41;

// ---------------------------------------------------------------------------
// Wheel speed sensor
// ---------------------------------------------------------------------------

/// Hall/optical encoder on the rear axle, pulse output, interrupt-driven.
pub const WHEEL_ENCODER_GPIO: i32 = 17;
