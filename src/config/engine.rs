//! Engine configuration - root configuration structure.

use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};

use super::pins::PinMap;
use super::source::{ConfigKey, ConfigSource};

/// Tunable parameters of the pulse engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// How long a step pin stays asserted, in microseconds.
    #[serde(default = "default_pulse_us")]
    pub microseconds_per_step_pulse: u32,

    /// Trapezoid generator tick frequency.
    #[serde(default = "default_acceleration_ticks")]
    pub acceleration_ticks_per_second: u32,

    /// Step rate floor in steps per minute. Slower requests are raised to this.
    #[serde(default = "default_minimum_rate")]
    pub minimum_steps_per_minute: u32,

    /// Highest step timer tick frequency in Hz.
    #[serde(default = "default_base_frequency")]
    pub base_stepping_frequency: u32,

    /// Reference clock feeding the timer peripheral, in Hz.
    #[serde(default = "default_timer_clock")]
    pub timer_clock_hz: u32,

    /// Step and direction pin assignment.
    #[serde(default)]
    pub pins: PinMap,
}

fn default_pulse_us() -> u32 {
    5
}

fn default_acceleration_ticks() -> u32 {
    100
}

fn default_minimum_rate() -> u32 {
    1200
}

fn default_base_frequency() -> u32 {
    100_000
}

fn default_timer_clock() -> u32 {
    25_000_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            microseconds_per_step_pulse: default_pulse_us(),
            acceleration_ticks_per_second: default_acceleration_ticks(),
            minimum_steps_per_minute: default_minimum_rate(),
            base_stepping_frequency: default_base_frequency(),
            timer_clock_hz: default_timer_clock(),
            pins: PinMap::default(),
        }
    }
}

impl EngineConfig {
    /// Read every setting from a checksum-keyed source.
    ///
    /// Settings missing from the source keep their defaults. The result is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or the combination fails
    /// validation.
    pub fn from_source<S: ConfigSource + ?Sized>(source: &S) -> Result<Self> {
        let mut config = Self::default();

        for key in ConfigKey::ALL {
            let Some(value) = source.value(key) else {
                continue;
            };

            match key {
                ConfigKey::MicrosecondsPerStepPulse => config.microseconds_per_step_pulse = value,
                ConfigKey::AccelerationTicksPerSecond => config.acceleration_ticks_per_second = value,
                ConfigKey::MinimumStepsPerMinute => config.minimum_steps_per_minute = value,
                ConfigKey::BaseSteppingFrequency => config.base_stepping_frequency = value,
                ConfigKey::TimerClockHz => config.timer_clock_hz = value,
                ConfigKey::StepGpioPort => config.pins.step_gpio_port = port(value)?,
                ConfigKey::DirGpioPort => config.pins.dir_gpio_port = port(value)?,
                ConfigKey::AlphaStepPin => config.pins.alpha_step_pin = pin(value)?,
                ConfigKey::BetaStepPin => config.pins.beta_step_pin = pin(value)?,
                ConfigKey::GammaStepPin => config.pins.gamma_step_pin = pin(value)?,
                ConfigKey::AlphaDirPin => config.pins.alpha_dir_pin = pin(value)?,
                ConfigKey::BetaDirPin => config.pins.beta_dir_pin = pin(value)?,
                ConfigKey::GammaDirPin => config.pins.gamma_dir_pin = pin(value)?,
            }
        }

        super::validation::validate_config(&config)?;
        Ok(config)
    }

    /// Pulse-reset channel reload: the pulse hold time in timer ticks.
    #[inline]
    pub fn pulse_reload(&self) -> u32 {
        (self.timer_clock_hz / 1_000_000).saturating_mul(self.microseconds_per_step_pulse)
    }

    /// Period of the trapezoid generator tick in microseconds.
    #[inline]
    pub fn trapezoid_period_us(&self) -> u32 {
        1_000_000 / self.acceleration_ticks_per_second.max(1)
    }
}

fn port(value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::Config(ConfigError::InvalidPort(u8::MAX)))
}

fn pin(value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::Config(ConfigError::InvalidPin(u8::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSource;

    #[test]
    fn test_pulse_reload() {
        let config = EngineConfig::default();

        // 25 ticks per microsecond * 5us
        assert_eq!(config.pulse_reload(), 125);
    }

    #[test]
    fn test_trapezoid_period() {
        let config = EngineConfig {
            acceleration_ticks_per_second: 1000,
            ..EngineConfig::default()
        };

        assert_eq!(config.trapezoid_period_us(), 1000);
    }

    #[test]
    fn test_from_source_overrides_defaults() {
        let mut source: MapSource<16> = MapSource::new();
        source.set(ConfigKey::MinimumStepsPerMinute, 3000).unwrap();
        source.set(ConfigKey::AlphaStepPin, 17).unwrap();
        source.set(ConfigKey::DirGpioPort, 2).unwrap();

        let config = EngineConfig::from_source(&source).unwrap();

        assert_eq!(config.minimum_steps_per_minute, 3000);
        assert_eq!(config.pins.alpha_step_pin, 17);
        assert_eq!(config.pins.dir_gpio_port, 2);
        assert_eq!(config.base_stepping_frequency, 100_000);
    }

    #[test]
    fn test_from_source_rejects_wide_pin() {
        let mut source: MapSource<16> = MapSource::new();
        source.set(ConfigKey::GammaDirPin, 400).unwrap();

        assert!(matches!(
            EngineConfig::from_source(&source),
            Err(Error::Config(ConfigError::InvalidPin(_)))
        ));
    }
}
