//! Thread spawning with core affinity on the dual-core ESP32-S3.
//!
//! On the board `std::thread` is a pthread over a FreeRTOS task.  The
//! pinning, priority and stack for the next `pthread_create` on the
//! calling thread come from `esp_pthread_set_cfg()`, so set-then-spawn
//! has to happen back to back.  Host builds ignore core and priority.
//!
//! Placement: the actuation loop runs alone on the APP core; the IO
//! executor and the line reader share the PRO core with the IDF tasks.

use std::io;
use std::thread::JoinHandle;

/// Host debug builds need far bigger frames than the firmware.
#[cfg(not(target_os = "espidf"))]
const SIM_MIN_STACK_KB: usize = 256;

/// The two LX7 cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: IDF housekeeping, UART console, input and display.
    Pro = 0,
    /// APP_CPU: the actuation loop.
    App = 1,
}

/// Spawn `f` on `core` and hand back its join handle.
///
/// `name` must end in a NUL (`"actuation\0"`) because the IDF keeps the
/// raw pointer; the Rust thread name drops it.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core<T, F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    // SAFETY: the config struct is fully initialised by the IDF default
    // constructor; `name` is a 'static NUL-terminated string, so the
    // pointer outlives the pthread_create call that consumes it.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!("TASK | {} on {:?} pri={} stack={}K", display_name, core, priority, stack_kb);

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Host variant: plain named thread with the requested stack.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core<T, F>(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let display_name = name.trim_end_matches('\0');
    log::info!("TASK | {} (sim) stack={}K", display_name, stack_kb);

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb.max(SIM_MIN_STACK_KB) * 1024)
        .spawn(f)
}
