//! Shared application state.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    drivers::argon_one::{
        BusChannel,
        button::{GpioButton, POWER_BUTTON_PIN},
    },
    power_button::{EdgeStream, PowerControl, SystemPower},
    sensors::{TemperatureSampler, TemperatureSensor},
    temperature_sensors::{ThermalZoneSensor, VcgencmdSensor},
};

/// Everything the daemon's loops need, built once at startup.
///
/// `settings` is immutable and shared without locking; `bus` serializes
/// writes internally.
pub struct AppState {
    /// Validated configuration
    pub settings: Arc<Settings>,
    /// Control channel to the case microcontroller
    pub bus: BusChannel,
    /// Combined temperature reading
    pub sampler: Arc<dyn TemperatureSensor>,
    /// Reboot and shutdown actions
    pub power: Arc<dyn PowerControl>,
    /// Button edges, handed to the button monitor once
    button: Mutex<Option<EdgeStream>>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        bus: BusChannel,
        sampler: Arc<dyn TemperatureSensor>,
        power: Arc<dyn PowerControl>,
        button: EdgeStream,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            bus,
            sampler,
            power,
            button: Mutex::new(Some(button)),
        }
    }

    /// Opens the Argon ONE hardware of the running board.
    ///
    /// Fails when the I2C bus or the button pin cannot be opened.
    pub fn open_hardware(settings: Settings) -> Result<Self> {
        let bus = BusChannel::open_for_board().context("Failed to open case control bus")?;
        let button = GpioButton::open(POWER_BUTTON_PIN, settings.timing.debounce)
            .context("Failed to open power button")?;
        let sampler = TemperatureSampler::new(vec![
            Box::new(ThermalZoneSensor::default()),
            Box::new(VcgencmdSensor::default()),
        ]);
        info!("Sampling temperature from {} sources", sampler.len());

        Ok(Self::new(
            settings,
            bus,
            Arc::new(sampler),
            Arc::new(SystemPower),
            button.into_stream(),
        ))
    }

    /// Takes the button edge stream; `None` once taken.
    pub async fn take_button(&self) -> Option<EdgeStream> {
        self.button.lock().await.take()
    }
}
