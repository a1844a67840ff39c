//! Engine configuration

use crate::psg::{DEFAULT_CHIP_CLOCK, DEFAULT_SAMPLE_RATE};
use crate::{PsgError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Accepted output sample rates (Hz)
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=96_000;

/// Accepted chip master clocks (Hz)
pub const CHIP_CLOCK_RANGE: RangeInclusive<u32> = 100_000..=8_000_000;

/// How the host real-time thread keeps time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Sleep to wall-clock deadlines, one per dispatch tick
    #[default]
    Realtime,
    /// Run as fast as the driver accepts samples
    Freerun,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate (Hz)
    pub sample_rate: u32,
    /// Chip master clock (Hz)
    pub chip_clock: u32,
    /// Host pacing of the real-time thread
    pub pacing: Pacing,
}

impl EngineConfig {
    /// Check that all values are usable
    pub fn validate(&self) -> Result<()> {
        if !SAMPLE_RATE_RANGE.contains(&self.sample_rate) {
            return Err(PsgError::Config(format!(
                "sample rate {} Hz outside {}..={} Hz",
                self.sample_rate,
                SAMPLE_RATE_RANGE.start(),
                SAMPLE_RATE_RANGE.end()
            )));
        }
        if !CHIP_CLOCK_RANGE.contains(&self.chip_clock) {
            return Err(PsgError::Config(format!(
                "chip clock {} Hz outside {}..={} Hz",
                self.chip_clock,
                CHIP_CLOCK_RANGE.start(),
                CHIP_CLOCK_RANGE.end()
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Same configuration with another pacing
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chip_clock: DEFAULT_CHIP_CLOCK,
            pacing: Pacing::Realtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.chip_clock, 2_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "sample_rate": 44100 }"#).unwrap();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.chip_clock, DEFAULT_CHIP_CLOCK);

        let config = EngineConfig::from_json_str(r#"{ "pacing": "freerun" }"#).unwrap();
        assert_eq!(config.pacing, Pacing::Freerun);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "sample_rate": 1000 }"#).unwrap_err();
        assert!(matches!(err, PsgError::Config(_)));

        let config = EngineConfig {
            chip_clock: 20_000_000,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = EngineConfig::from_json_str("{ sample_rate").unwrap_err();
        assert!(matches!(err, PsgError::Config(_)));
    }
}
