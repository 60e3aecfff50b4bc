pub mod calibrated;
pub mod interval;
pub mod render;
pub mod volume;
