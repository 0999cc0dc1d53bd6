//! Pure control math: steering map, gearbox and speed ramp.

pub mod drive;
pub mod steering;
pub mod transmission;
