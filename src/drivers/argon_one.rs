//! Argon ONE case: I2C control channel and power button input.

pub mod button;
pub mod device_io;
pub mod protocol;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use rppal::system::{DeviceInfo, Model};
use tokio::sync::Mutex;

use self::{
    device_io::{DeviceIO, open_i2c},
    protocol::{CONTROL_REGISTER, Command},
};

/// Picks the I2C bus wired to the header for a board model.
///
/// Only the first Model B revision routes the header to bus 0.
pub fn bus_for_model(model: Model) -> u8 {
    match model {
        Model::RaspberryPiBRev1 => 0,
        _ => 1,
    }
}

/// Serialized write access to the case microcontroller.
///
/// Every clone shares one device; each [`send`](Self::send) holds the lock for
/// exactly one register write.
#[derive(Clone)]
pub struct BusChannel {
    dev: Arc<Mutex<Box<dyn DeviceIO>>>,
}

impl std::fmt::Debug for BusChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusChannel").finish_non_exhaustive()
    }
}

impl BusChannel {
    pub fn new(dev: impl DeviceIO) -> Self {
        Self {
            dev: Arc::new(Mutex::new(Box::new(dev))),
        }
    }

    /// Opens the I2C bus matching the detected board.
    pub fn open_for_board() -> Result<Self> {
        let model = DeviceInfo::new()
            .context("Failed to identify Raspberry Pi model")?
            .model();
        let bus = bus_for_model(model);
        info!("Detected {model}, using I2C bus {bus}");
        Ok(Self::new(open_i2c(bus)?))
    }

    /// Writes one command to the control register.
    ///
    /// Failures are returned as-is; the channel never retries.
    pub async fn send(&self, command: Command) -> Result<()> {
        let value = command.to_byte();
        let dev = self.dev.lock().await;
        debug!("Writing {value:#04x} ({command:?})");
        dev.write_register(CONTROL_REGISTER, value)
    }
}
