//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::pins::{PinMap, MAX_PIN, MAX_PORT};
use super::EngineConfig;

/// Validate an engine configuration.
///
/// Checks:
/// - Frequencies, the rate floor and the timer clock are non-zero
/// - The base stepping frequency does not exceed the timer clock
/// - The step pulse fits inside one base step period
/// - Ports and pins are in range, with no pin assigned twice on a port
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let frequencies = [
        ("acceleration_ticks_per_second", config.acceleration_ticks_per_second),
        ("minimum_steps_per_minute", config.minimum_steps_per_minute),
        ("base_stepping_frequency", config.base_stepping_frequency),
        ("timer_clock_hz", config.timer_clock_hz),
    ];
    for (field, value) in frequencies {
        if value == 0 {
            return Err(Error::Config(ConfigError::InvalidFrequency(field)));
        }
    }

    if config.base_stepping_frequency > config.timer_clock_hz {
        return Err(Error::Config(ConfigError::ClockTooSlow {
            clock_hz: config.timer_clock_hz,
            base_hz: config.base_stepping_frequency,
        }));
    }

    // The pin must be released before the next step can be asserted
    let pulse_ticks = config.microseconds_per_step_pulse as u64 * config.base_stepping_frequency as u64;
    if pulse_ticks >= 1_000_000 {
        return Err(Error::Config(ConfigError::PulseTooLong {
            pulse_us: config.microseconds_per_step_pulse,
            period_us: 1_000_000 / config.base_stepping_frequency,
        }));
    }

    validate_pins(&config.pins)
}

fn validate_pins(pins: &PinMap) -> Result<()> {
    for port in [pins.step_gpio_port, pins.dir_gpio_port] {
        if port > MAX_PORT {
            return Err(Error::Config(ConfigError::InvalidPort(port)));
        }
    }

    for pin in pins.step_pins().into_iter().chain(pins.dir_pins()) {
        if pin > MAX_PIN {
            return Err(Error::Config(ConfigError::InvalidPin(pin)));
        }
    }

    check_distinct(&pins.step_pins())?;
    check_distinct(&pins.dir_pins())?;

    if pins.step_gpio_port == pins.dir_gpio_port {
        for pin in pins.step_pins() {
            if pins.dir_pins().contains(&pin) {
                return Err(Error::Config(ConfigError::DuplicatePin(pin)));
            }
        }
    }

    Ok(())
}

fn check_distinct(group: &[u8]) -> Result<()> {
    for (i, pin) in group.iter().enumerate() {
        if group[i + 1..].contains(pin) {
            return Err(Error::Config(ConfigError::DuplicatePin(*pin)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_floor_rejected() {
        let config = EngineConfig {
            minimum_steps_per_minute: 0,
            ..EngineConfig::default()
        };

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidFrequency("minimum_steps_per_minute")))
        );
    }

    #[test]
    fn test_pulse_longer_than_period_rejected() {
        // 100kHz base gives a 10us period
        let config = EngineConfig {
            microseconds_per_step_pulse: 10,
            ..EngineConfig::default()
        };

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::PulseTooLong {
                pulse_us: 10,
                period_us: 10,
            }))
        );
    }

    #[test]
    fn test_shared_port_overlap_rejected() {
        let mut config = EngineConfig::default();
        config.pins.gamma_dir_pin = config.pins.alpha_step_pin;

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicatePin(0)))
        ));

        // Same pin number on different ports is fine
        config.pins.dir_gpio_port = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_out_of_range_port_rejected() {
        let mut config = EngineConfig::default();
        config.pins.step_gpio_port = 5;

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidPort(5)))
        );
    }

    #[test]
    fn test_clock_slower_than_base_rejected() {
        let config = EngineConfig {
            timer_clock_hz: 50_000,
            ..EngineConfig::default()
        };

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::ClockTooSlow { .. }))
        ));
    }
}
