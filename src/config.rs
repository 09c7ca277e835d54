//! Configuration management for argononed.
//!
//! Handles loading, default substitution and validation of the YAML
//! configuration file that defines the fan threshold table and the power
//! button timing ranges.

use crate::fan_curve::ThresholdTable;
use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/argononed.yml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "ARGONONE_CONFIG_FILE";

/// Main configuration structure as stored on disk.
///
/// # Example
///
/// ```yaml
/// fan:
///   temperatures: [55.0, 60.0, 65.0]
///   speeds: [10, 55, 100]
///   check_temperature_interval: 30
/// poweroff:
///   reboot_range: [1.0, 2.0]
///   shutdown_range: [2.0, 10.0]
///   debounce_time: 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fan threshold table and polling interval.
    pub fan: FanCfg,

    /// Power button timing.
    pub poweroff: PowerOffCfg,
}

/// Fan section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanCfg {
    /// Temperature thresholds in Celsius.
    pub temperatures: Vec<f32>,

    /// Speed percentages (0-100), one per threshold.
    pub speeds: Vec<u8>,

    /// Seconds between two temperature checks.
    pub check_temperature_interval: f64,
}

/// Power button section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerOffCfg {
    /// Hold duration window in seconds that triggers a reboot.
    pub reboot_range: [f64; 2],

    /// Hold duration window in seconds that triggers a shutdown.
    pub shutdown_range: [f64; 2],

    /// Button debounce window in seconds.
    pub debounce_time: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fan: FanCfg {
                temperatures: vec![55.0, 60.0, 65.0],
                speeds: vec![10, 55, 100],
                check_temperature_interval: 30.0,
            },
            poweroff: PowerOffCfg {
                reboot_range: [1.0, 2.0],
                shutdown_range: [2.0, 10.0],
                debounce_time: 0.5,
            },
        }
    }
}

impl Config {
    /// Validates the configuration without building the runtime settings.
    pub fn validate(&self) -> Result<()> {
        Settings::try_from(self).map(|_| ())
    }

    /// Fills every key missing from `partial` with the matching value of `defaults`.
    fn resolve(partial: PartialConfig, defaults: &Config) -> Self {
        let fan = partial.fan.unwrap_or_default();
        let poweroff = partial.poweroff.unwrap_or_default();

        Self {
            fan: FanCfg {
                temperatures: or_default(
                    fan.temperatures,
                    "fan.temperatures",
                    &defaults.fan.temperatures,
                ),
                speeds: or_default(fan.speeds, "fan.speeds", &defaults.fan.speeds),
                check_temperature_interval: or_default(
                    fan.check_temperature_interval,
                    "fan.check_temperature_interval",
                    &defaults.fan.check_temperature_interval,
                ),
            },
            poweroff: PowerOffCfg {
                reboot_range: or_default(
                    poweroff.reboot_range,
                    "poweroff.reboot_range",
                    &defaults.poweroff.reboot_range,
                ),
                shutdown_range: or_default(
                    poweroff.shutdown_range,
                    "poweroff.shutdown_range",
                    &defaults.poweroff.shutdown_range,
                ),
                debounce_time: or_default(
                    poweroff.debounce_time,
                    "poweroff.debounce_time",
                    &defaults.poweroff.debounce_time,
                ),
            },
        }
    }
}

/// On-disk shape with every key optional, so absent keys can be reported one by one.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    fan: Option<PartialFanCfg>,
    poweroff: Option<PartialPowerOffCfg>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialFanCfg {
    temperatures: Option<Vec<f32>>,
    speeds: Option<Vec<u8>>,
    check_temperature_interval: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialPowerOffCfg {
    reboot_range: Option<[f64; 2]>,
    shutdown_range: Option<[f64; 2]>,
    debounce_time: Option<f64>,
}

fn or_default<T: Clone + Debug>(value: Option<T>, key: &str, default: &T) -> T {
    value.unwrap_or_else(|| {
        warn!("Configuration key '{key}' not found. Using default value '{default:?}'");
        default.clone()
    })
}

/// Open time window `(min, max)` for a button hold duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: Duration,
    pub max: Duration,
}

impl TimeRange {
    /// Builds a range from `[min, max]` seconds.
    pub fn from_secs(name: &str, [min, max]: [f64; 2]) -> Result<Self> {
        let min = duration_from_secs(name, min)?;
        let max = duration_from_secs(name, max)?;
        if min >= max {
            bail!(
                "Range '{name}' must have min < max, got [{}, {}]",
                min.as_secs_f64(),
                max.as_secs_f64()
            );
        }
        Ok(Self { min, max })
    }

    /// Strict containment: both bounds are outside the range.
    pub fn contains(&self, held: Duration) -> bool {
        self.min < held && held < self.max
    }
}

/// Button hold windows and debounce time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerTimingRanges {
    pub reboot: TimeRange,
    pub shutdown: TimeRange,
    pub debounce: Duration,
}

fn duration_from_secs(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("'{name}' must be a non-negative number of seconds, got {secs}"))
}

/// Validated, immutable runtime settings.
///
/// Built once at startup and shared read-only between the fan loop and the
/// button monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fan_table: ThresholdTable,
    pub check_interval: Duration,
    pub timing: PowerTimingRanges,
}

impl TryFrom<&Config> for Settings {
    type Error = anyhow::Error;

    fn try_from(config: &Config) -> Result<Self> {
        let fan_table = ThresholdTable::new(&config.fan.temperatures, &config.fan.speeds)
            .context("Invalid 'fan' section")?;

        let check_interval = duration_from_secs(
            "fan.check_temperature_interval",
            config.fan.check_temperature_interval,
        )?;
        if check_interval.is_zero() {
            bail!("'fan.check_temperature_interval' must be greater than zero");
        }

        let timing = PowerTimingRanges {
            reboot: TimeRange::from_secs("poweroff.reboot_range", config.poweroff.reboot_range)?,
            shutdown: TimeRange::from_secs(
                "poweroff.shutdown_range",
                config.poweroff.shutdown_range,
            )?,
            debounce: duration_from_secs("poweroff.debounce_time", config.poweroff.debounce_time)?,
        };

        Ok(Self {
            fan_table,
            check_interval,
            timing,
        })
    }
}

/// Loads and saves the configuration file.
///
/// # Example
///
/// ```no_run
/// use argononed::config::ConfigManager;
///
/// let manager = ConfigManager::load("/etc/argononed.yml")?;
/// let settings = manager.settings()?;
/// println!("checking every {:?}", settings.check_interval);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Config,
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the given config and path.
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }

    /// Loads configuration from `path`, falling back to [`Config::default`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_defaults(path, &Config::default())
    }

    /// Loads configuration from `path`, taking absent values from `defaults`.
    ///
    /// A missing file yields `defaults` unchanged. Missing sections and keys
    /// are filled individually. Each substitution is logged as a warning.
    pub fn load_with_defaults(path: impl AsRef<Path>, defaults: &Config) -> Result<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Config file '{}' not found. Using default config.",
                    path.display()
                );
                if let Some(legacy) = legacy_config_for(path) {
                    warn!(
                        "Found '{}', which is no longer read. Convert it to YAML at '{}'.",
                        legacy.display(),
                        path.display()
                    );
                }
                return Ok(Self::new(defaults.clone(), path.to_path_buf()));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };

        info!("Loading config from: {}", path.display());
        let partial: PartialConfig = if content.trim().is_empty() {
            PartialConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML in: {}", path.display()))?
        };

        Ok(Self::new(
            Config::resolve(partial, defaults),
            path.to_path_buf(),
        ))
    }

    /// Gets a read-only reference to the loaded configuration.
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Returns the path the configuration was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates the configuration and builds the runtime settings.
    pub fn settings(&self) -> Result<Settings> {
        Settings::try_from(&self.config).with_context(|| {
            format!(
                "Configuration validation failed for: {}",
                self.path.display()
            )
        })
    }

    /// Saves configuration to a specific path.
    pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
        let config_yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration")?;

        let tmp_path = path.with_extension("yml.tmp");
        fs::write(&tmp_path, config_yaml).with_context(|| {
            format!("Failed to write temporary config to {}", tmp_path.display())
        })?;

        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move config to {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }
}

/// Returns the TOML file an older install kept next to `path`, if present.
pub fn legacy_config_for(path: &Path) -> Option<PathBuf> {
    let legacy = path.with_extension("toml");
    (legacy != path && legacy.is_file()).then_some(legacy)
}

/// Writes the built-in default configuration to `path`.
pub fn write_default(path: &Path) -> Result<()> {
    ConfigManager::save_to_path(&Config::default(), path)
}
