//! Temperature sources and the sampler that combines them.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};

/// A single temperature reading source.
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    async fn read_temperature(&self) -> Result<f32>;

    fn sensor_name(&self) -> &str {
        "unnamed"
    }
}

/// Averages every source that produced a reading.
///
/// A failing source contributes nothing. When no source succeeds the read
/// fails, and the caller decides how to degrade.
pub struct TemperatureSampler {
    sources: Vec<Box<dyn TemperatureSensor>>,
}

impl TemperatureSampler {
    pub fn new(sources: Vec<Box<dyn TemperatureSensor>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl TemperatureSensor for TemperatureSampler {
    async fn read_temperature(&self) -> Result<f32> {
        let mut sum = 0.0f32;
        let mut count = 0u16;

        for source in &self.sources {
            match source.read_temperature().await {
                Ok(t) if t.is_finite() => {
                    debug!("Temperature of {}: {t:.1}°C", source.sensor_name());
                    sum += t;
                    count += 1;
                }
                Ok(t) => warn!("Discarding non-finite reading {t} from {}", source.sensor_name()),
                Err(e) => warn!("Failed to read {}: {e:#}", source.sensor_name()),
            }
        }

        if count == 0 {
            return Err(anyhow!(
                "No temperature source produced a reading ({} configured)",
                self.sources.len()
            ));
        }

        Ok(sum / f32::from(count))
    }

    fn sensor_name(&self) -> &str {
        "sampler"
    }
}
