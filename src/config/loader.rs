//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::EngineConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_pulse::load_config;
///
/// let config = load_config("stepper.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    // Validate the configuration
    super::validation::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
microseconds_per_step_pulse = 2
acceleration_ticks_per_second = 1000
minimum_steps_per_minute = 600
base_stepping_frequency = 50000
timer_clock_hz = 24000000

[pins]
step_gpio_port = 2
dir_gpio_port = 0
alpha_step_pin = 0
beta_step_pin = 1
gamma_step_pin = 2
alpha_dir_pin = 5
beta_dir_pin = 11
gamma_dir_pin = 20
"#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.microseconds_per_step_pulse, 2);
        assert_eq!(config.acceleration_ticks_per_second, 1000);
        assert_eq!(config.pins.step_gpio_port, 2);
        assert_eq!(config.pins.gamma_dir_pin, 20);
    }

    #[test]
    fn test_parse_rejects_invalid_pins() {
        let toml = r#"
[pins]
alpha_step_pin = 40
"#;

        assert!(matches!(
            parse_config(toml),
            Err(Error::Config(ConfigError::InvalidPin(40)))
        ));
    }

    #[test]
    fn test_parse_reports_syntax_errors() {
        assert!(matches!(
            parse_config("base_stepping_frequency = ["),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }
}
