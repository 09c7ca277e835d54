//! Temperature-driven fan speed loop.
//!
//! Each iteration samples the temperature, picks a speed from the threshold
//! table and writes it to the case. Speed decreases are held back for one
//! extra interval so a reading jittering around a threshold does not make the
//! fan hunt between two speeds.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    drivers::argon_one::{BusChannel, protocol::Command},
    fan_curve::ThresholdTable,
    sensors::TemperatureSensor,
};

/// Temperature assumed when no sensor can be read.
pub const FAILSAFE_TEMPERATURE: f32 = f32::MAX;

/// Mutable loop state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanState {
    /// Last speed handed to the bus.
    pub previous_speed: u8,
}

/// Outcome of one speed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub speed: u8,
    /// The speed goes down; wait one more interval before writing it.
    pub deferred: bool,
}

pub struct FanController {
    table: ThresholdTable,
    interval: Duration,
    sampler: Arc<dyn TemperatureSensor>,
    bus: BusChannel,
    state: FanState,
}

impl FanController {
    pub fn new(settings: &Settings, sampler: Arc<dyn TemperatureSensor>, bus: BusChannel) -> Self {
        Self {
            table: settings.fan_table.clone(),
            interval: settings.check_interval,
            sampler,
            bus,
            state: FanState::default(),
        }
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    /// Reads the temperature, assuming the worst when every source fails.
    pub async fn sample(&self) -> f32 {
        match self.sampler.read_temperature().await {
            Ok(t) => t,
            Err(e) => {
                error!("Temperature unavailable, running fan at full speed: {e:#}");
                FAILSAFE_TEMPERATURE
            }
        }
    }

    pub fn decide(&self, temperature: f32) -> Decision {
        let speed = self.table.speed_for(temperature);
        Decision {
            speed,
            deferred: speed < self.state.previous_speed,
        }
    }

    /// Records `speed` as current and writes it to the case.
    pub async fn apply(&mut self, speed: u8) -> Result<()> {
        self.state.previous_speed = speed;
        self.bus.send(Command::FanSpeed(speed)).await
    }

    /// Runs until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Fan control started, checking every {:?}",
            self.interval
        );

        loop {
            let temperature = self.sample().await;
            let decision = self.decide(temperature);
            debug!("Temperature {temperature:.1}°C -> {}%", decision.speed);

            if decision.deferred {
                debug!(
                    "Lowering fan from {}% to {}% after one more interval",
                    self.state.previous_speed, decision.speed
                );
                if !self.pause(&cancel).await {
                    break;
                }
            }

            if let Err(e) = self.apply(decision.speed).await {
                error!("Failed to set fan speed to {}%: {e:#}", decision.speed);
            }

            if !self.pause(&cancel).await {
                break;
            }
        }

        info!("Fan control cancelled");
        Ok(())
    }

    /// Sleeps one interval. Returns `false` when cancelled.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(self.interval) => true,
        }
    }
}
