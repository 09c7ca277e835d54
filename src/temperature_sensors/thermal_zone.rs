use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::sensors::TemperatureSensor;

/// Kernel thermal zone exposing the SoC temperature.
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reads a sysfs thermal zone reporting millidegrees Celsius.
pub struct ThermalZoneSensor {
    path: PathBuf,
}

impl ThermalZoneSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ThermalZoneSensor {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE)
    }
}

#[async_trait]
impl TemperatureSensor for ThermalZoneSensor {
    async fn read_temperature(&self) -> Result<f32> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let millidegrees: f32 = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid thermal zone value {:?}", raw.trim()))?;
        Ok(millidegrees / 1000.0)
    }

    fn sensor_name(&self) -> &str {
        "thermal_zone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn converts_millidegrees() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "48312").unwrap();

        let sensor = ThermalZoneSensor::new(file.path());
        assert_eq!(sensor.read_temperature().await.unwrap(), 48.312);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let sensor = ThermalZoneSensor::new("/nonexistent/thermal_zone0/temp");
        assert!(sensor.read_temperature().await.is_err());
    }

    #[tokio::test]
    async fn garbage_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hot").unwrap();

        let sensor = ThermalZoneSensor::new(file.path());
        assert!(sensor.read_temperature().await.is_err());
    }
}
