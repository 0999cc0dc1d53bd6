//! One-shot hardware peripheral initialization.
//!
//! Configures the wheel-encoder GPIO and registers its edge ISR using raw
//! ESP-IDF sys calls.  Called once from `main()` before the runtime starts.
//! The I²C master is brought up through `esp-idf-hal` in `main()` because
//! its driver is what the PWM and ADC drivers borrow.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── Wheel encoder ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn wheel_encoder_isr(_arg: *mut core::ffi::c_void) {
    crate::sensors::speed::wheel_isr_handler();
}

/// Configure the encoder pin as a pulled-up input and attach the
/// rising-edge ISR that feeds [`WHEEL_PULSES`](crate::sensors::speed::WHEEL_PULSES).
#[cfg(target_os = "espidf")]
pub fn init_wheel_encoder() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::WHEEL_ENCODER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    // SAFETY: called once from main() before any task is spawned; the
    // handler is a plain function that only touches an AtomicU32.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }

        // ESP_ERR_INVALID_STATE means the service is already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(
            pins::WHEEL_ENCODER_GPIO,
            Some(wheel_encoder_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrHandlerFailed(ret));
        }
        gpio_intr_enable(pins::WHEEL_ENCODER_GPIO);
    }

    info!("hw_init: wheel encoder ISR on GPIO{}", pins::WHEEL_ENCODER_GPIO);
    Ok(())
}

/// Host builds have no encoder; pulses come from tests or a simulator
/// calling [`wheel_isr_handler`](crate::sensors::speed::wheel_isr_handler).
#[cfg(not(target_os = "espidf"))]
pub fn init_wheel_encoder() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): wheel encoder ISR skipped");
    Ok(())
}

/// Detach the encoder ISR during shutdown.
#[cfg(target_os = "espidf")]
pub fn release_wheel_encoder() {
    // SAFETY: removing a handler that may or may not be registered is a
    // no-op error in IDF; the ISR itself holds no resources.
    unsafe {
        gpio_intr_disable(pins::WHEEL_ENCODER_GPIO);
        gpio_isr_handler_remove(pins::WHEEL_ENCODER_GPIO);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn release_wheel_encoder() {}
