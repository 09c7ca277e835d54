//! Threshold table used to pick a fan speed for a temperature.
//!
//! The table maps temperature thresholds to speed percentages. A temperature
//! selects the speed of the greatest threshold that does not exceed it.

use anyhow::{Result, bail};

/// Sorted temperature → speed mapping.
///
/// Thresholds are unique, finite and sorted ascending. The table is never empty.
///
/// # Example
///
/// ```
/// use argononed::fan_curve::ThresholdTable;
///
/// let table = ThresholdTable::new(&[60.0, 55.0, 65.0], &[55, 10, 100])?;
/// assert_eq!(table.speed_for(58.0), 10);
/// assert_eq!(table.speed_for(70.0), 100);
/// assert_eq!(table.speed_for(20.0), 10); // below every threshold
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    entries: Vec<(f32, u8)>,
}

impl ThresholdTable {
    /// Builds a table from parallel threshold and speed lists.
    ///
    /// # Errors
    ///
    /// Fails when the lists differ in length, are empty, contain a non-finite
    /// threshold or contain the same threshold twice.
    pub fn new(temperatures: &[f32], speeds: &[u8]) -> Result<Self> {
        if temperatures.len() != speeds.len() {
            bail!(
                "Fan table has mismatched temperatures ({}) and speeds ({})",
                temperatures.len(),
                speeds.len()
            );
        }
        if temperatures.is_empty() {
            bail!("Fan table cannot be empty");
        }
        if let Some(t) = temperatures.iter().find(|t| !t.is_finite()) {
            bail!("Fan table threshold {t} is not a finite temperature");
        }

        let mut entries: Vec<(f32, u8)> = temperatures
            .iter()
            .copied()
            .zip(speeds.iter().copied())
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            bail!("Fan table has duplicate threshold {}", pair[0].0);
        }

        Ok(Self { entries })
    }

    /// Returns the speed for `temperature`.
    ///
    /// Temperatures below every threshold (and NaN) get the lowest configured speed.
    pub fn speed_for(&self, temperature: f32) -> u8 {
        self.entries
            .iter()
            .rev()
            .find(|(threshold, _)| *threshold <= temperature)
            .map(|(_, speed)| *speed)
            .unwrap_or_else(|| self.lowest_speed())
    }

    /// Lowest speed in the table.
    pub fn lowest_speed(&self) -> u8 {
        self.entries.iter().map(|(_, s)| *s).min().unwrap_or(0)
    }

    /// Sorted `(threshold, speed)` pairs.
    pub fn entries(&self) -> &[(f32, u8)] {
        &self.entries
    }
}
