use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::warn;
use tokio::process::Command;

use crate::sensors::TemperatureSensor;

/// Reading used when the `vcgencmd` output cannot be parsed.
pub const FALLBACK_TEMPERATURE: f32 = 100.0;

/// Queries the VideoCore firmware through `vcgencmd measure_temp`.
pub struct VcgencmdSensor {
    program: String,
}

impl VcgencmdSensor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for VcgencmdSensor {
    fn default() -> Self {
        Self::new("vcgencmd")
    }
}

/// Extracts the value from `temp=<float>'C`.
pub fn parse_measure_temp(output: &str) -> Option<f32> {
    output
        .trim()
        .strip_prefix("temp=")?
        .strip_suffix("'C")?
        .parse()
        .ok()
        .filter(|t: &f32| t.is_finite())
}

#[async_trait]
impl TemperatureSensor for VcgencmdSensor {
    async fn read_temperature(&self) -> Result<f32> {
        let output = Command::new(&self.program)
            .arg("measure_temp")
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            bail!("{} measure_temp exited with {}", self.program, output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_measure_temp(&stdout).unwrap_or_else(|| {
            warn!(
                "Unexpected {} output {:?}, assuming {FALLBACK_TEMPERATURE}°C",
                self.program,
                stdout.trim()
            );
            FALLBACK_TEMPERATURE
        }))
    }

    fn sensor_name(&self) -> &str {
        "vcgencmd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_firmware_output() {
        assert_eq!(parse_measure_temp("temp=48.3'C\n"), Some(48.3));
        assert_eq!(parse_measure_temp("temp=60'C"), Some(60.0));
    }

    #[test]
    fn rejects_unexpected_output() {
        assert_eq!(parse_measure_temp(""), None);
        assert_eq!(parse_measure_temp("error=1 error_msg=\"Command not registered\""), None);
        assert_eq!(parse_measure_temp("temp=abc'C"), None);
        assert_eq!(parse_measure_temp("temp=nan'C"), None);
    }

    #[tokio::test]
    async fn unparseable_output_reads_as_fallback() {
        // `echo measure_temp` succeeds but prints no `temp=` line.
        let sensor = VcgencmdSensor::new("echo");
        assert_eq!(sensor.read_temperature().await.unwrap(), FALLBACK_TEMPERATURE);
        assert_eq!(FALLBACK_TEMPERATURE, 100.0);
    }

    #[tokio::test]
    async fn failing_program_is_an_error() {
        let sensor = VcgencmdSensor::new("false");
        assert!(sensor.read_temperature().await.is_err());
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let sensor = VcgencmdSensor::new("/nonexistent/vcgencmd");
        assert!(sensor.read_temperature().await.is_err());
    }
}
