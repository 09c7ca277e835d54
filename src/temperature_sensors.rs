//! Concrete temperature sources available on a Raspberry Pi.

pub mod thermal_zone;
pub mod vcgencmd;

pub use thermal_zone::ThermalZoneSensor;
pub use vcgencmd::VcgencmdSensor;
