//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `smarthome.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use serde::Deserialize;

use smarthome_domain::device::RampStep;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Ramp pacing used when a thermostat `start` omits it.
    pub thermostat: ThermostatConfig,
    /// Event bus settings.
    pub events: EventsConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    /// Pause before each ramp step, in seconds.
    pub step_seconds: f64,
    /// Largest change per ramp step, in degrees Celsius.
    pub step_degrees: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity.
    pub capacity: usize,
}

impl Config {
    /// Load configuration from `smarthome.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("smarthome.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SMARTHOME_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.events.capacity == 0 {
            return Err(ConfigError::Validation(
                "events.capacity must be non-zero".to_string(),
            ));
        }
        self.ramp_step()?;
        Ok(())
    }

    /// Ramp pacing built from the `[thermostat]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a negative pause or a
    /// non-positive step.
    pub fn ramp_step(&self) -> Result<RampStep, ConfigError> {
        RampStep::new(self.thermostat.step_seconds, self.thermostat.step_degrees).map_err(|_| {
            ConfigError::Validation(
                "thermostat.step_seconds must be >= 0 and thermostat.step_degrees > 0"
                    .to_string(),
            )
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smarthomed=info,smarthome_app=info".to_string(),
        }
    }
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            step_seconds: 1.0,
            step_degrees: 0.5,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.events.capacity, 256);
        assert_eq!(config.logging.filter, "smarthomed=info,smarthome_app=info");
        let step = config.ramp_step().unwrap();
        assert_eq!(step.pause, Duration::from_secs(1));
        assert!((step.degrees - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.events.capacity, 256);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            filter = 'debug'

            [thermostat]
            step_seconds = 0.25
            step_degrees = 1.0

            [events]
            capacity = 16
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.events.capacity, 16);
        assert_eq!(config.ramp_step().unwrap().pause, Duration::from_millis(250));
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [thermostat]
            step_degrees = 2.0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!((config.thermostat.step_seconds - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.events.capacity, 256);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.events.capacity, 256);
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_accept_zero_pause() {
        let mut config = Config::default();
        config.thermostat.step_seconds = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_capacity() {
        let mut config = Config::default();
        config.events.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_non_positive_step() {
        let mut config = Config::default();
        config.thermostat.step_degrees = 0.0;
        assert!(config.validate().is_err());
        config.thermostat.step_degrees = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_negative_pause() {
        let mut config = Config::default();
        config.thermostat.step_seconds = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_pause_too_long_for_a_duration() {
        let toml = "
            [thermostat]
            step_seconds = 1e300
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
