fn main() {
    // Host builds (`--no-default-features`) have no ESP-IDF toolchain to
    // report; only the firmware build needs the sysenv forwarded.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
