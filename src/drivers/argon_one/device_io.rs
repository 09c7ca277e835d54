use anyhow::{Context, Result};
use rppal::i2c::I2c;

use super::protocol::DEVICE_ADDRESS;

/// Single-register write access to the case microcontroller.
pub trait DeviceIO: Send + 'static {
    fn write_register(&self, register: u8, value: u8) -> Result<()>;
}

/// Opens I2C bus `bus` addressed at the case microcontroller.
pub fn open_i2c(bus: u8) -> Result<I2c> {
    let mut i2c = I2c::with_bus(bus).with_context(|| format!("Failed to open I2C bus {bus}"))?;
    i2c.set_slave_address(DEVICE_ADDRESS)
        .with_context(|| format!("Failed to address device {DEVICE_ADDRESS:#04x}"))?;
    Ok(i2c)
}

impl DeviceIO for I2c {
    fn write_register(&self, register: u8, value: u8) -> Result<()> {
        self.smbus_write_byte(register, value)
            .with_context(|| format!("I2C write of {value:#04x} to register {register:#04x} failed"))
    }
}
