//! Checksum-keyed configuration lookups.
//!
//! Settings are addressed by the Fletcher-16 checksum of their name so the
//! names themselves never have to be stored on the target.

use heapless::FnvIndexMap;

use crate::error::{ConfigError, Error, Result};

/// Fletcher-16 checksum of a setting name.
pub const fn checksum(name: &str) -> u16 {
    let bytes = name.as_bytes();
    let mut sum1: u16 = 0;
    let mut sum2: u16 = 0;
    let mut i = 0;
    while i < bytes.len() {
        sum1 = (sum1 + bytes[i] as u16) % 255;
        sum2 = (sum2 + sum1) % 255;
        i += 1;
    }
    (sum2 << 8) | sum1
}

/// Every setting the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigKey {
    /// Step pulse hold time in microseconds.
    MicrosecondsPerStepPulse,
    /// Trapezoid generator tick frequency.
    AccelerationTicksPerSecond,
    /// Step rate floor in steps per minute.
    MinimumStepsPerMinute,
    /// Highest step timer tick frequency in Hz.
    BaseSteppingFrequency,
    /// Timer peripheral reference clock in Hz.
    TimerClockHz,
    /// Port of the step pins.
    StepGpioPort,
    /// Port of the direction pins.
    DirGpioPort,
    /// Alpha step pin.
    AlphaStepPin,
    /// Beta step pin.
    BetaStepPin,
    /// Gamma step pin.
    GammaStepPin,
    /// Alpha direction pin.
    AlphaDirPin,
    /// Beta direction pin.
    BetaDirPin,
    /// Gamma direction pin.
    GammaDirPin,
}

impl ConfigKey {
    /// All keys.
    pub const ALL: [ConfigKey; 13] = [
        ConfigKey::MicrosecondsPerStepPulse,
        ConfigKey::AccelerationTicksPerSecond,
        ConfigKey::MinimumStepsPerMinute,
        ConfigKey::BaseSteppingFrequency,
        ConfigKey::TimerClockHz,
        ConfigKey::StepGpioPort,
        ConfigKey::DirGpioPort,
        ConfigKey::AlphaStepPin,
        ConfigKey::BetaStepPin,
        ConfigKey::GammaStepPin,
        ConfigKey::AlphaDirPin,
        ConfigKey::BetaDirPin,
        ConfigKey::GammaDirPin,
    ];

    /// Setting name as written in configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            ConfigKey::MicrosecondsPerStepPulse => "microseconds_per_step_pulse",
            ConfigKey::AccelerationTicksPerSecond => "acceleration_ticks_per_second",
            ConfigKey::MinimumStepsPerMinute => "minimum_steps_per_minute",
            ConfigKey::BaseSteppingFrequency => "base_stepping_frequency",
            ConfigKey::TimerClockHz => "timer_clock_hz",
            ConfigKey::StepGpioPort => "step_gpio_port",
            ConfigKey::DirGpioPort => "dir_gpio_port",
            ConfigKey::AlphaStepPin => "alpha_step_pin",
            ConfigKey::BetaStepPin => "beta_step_pin",
            ConfigKey::GammaStepPin => "gamma_step_pin",
            ConfigKey::AlphaDirPin => "alpha_dir_pin",
            ConfigKey::BetaDirPin => "beta_dir_pin",
            ConfigKey::GammaDirPin => "gamma_dir_pin",
        }
    }

    /// Lookup checksum of this key.
    #[inline]
    pub const fn checksum(self) -> u16 {
        checksum(self.name())
    }
}

/// A store of numeric settings keyed by name checksum.
pub trait ConfigSource {
    /// Raw lookup by checksum.
    fn get(&self, checksum: u16) -> Option<u32>;

    /// Lookup by key.
    fn value(&self, key: ConfigKey) -> Option<u32> {
        self.get(key.checksum())
    }
}

/// In-memory configuration source.
///
/// `N` must be a power of two.
#[derive(Debug, Default)]
pub struct MapSource<const N: usize> {
    values: FnvIndexMap<u16, u32, N>,
}

impl<const N: usize> MapSource<N> {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            values: FnvIndexMap::new(),
        }
    }

    /// Store a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceFull` if the key is new and there is no room.
    pub fn set(&mut self, key: ConfigKey, value: u32) -> Result<()> {
        self.set_raw(key.checksum(), value)
    }

    /// Store a value under a raw checksum.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceFull` if the key is new and there is no room.
    pub fn set_raw(&mut self, checksum: u16, value: u32) -> Result<()> {
        self.values
            .insert(checksum, value)
            .map(|_| ())
            .map_err(|_| Error::Config(ConfigError::SourceFull))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<const N: usize> ConfigSource for MapSource<N> {
    fn get(&self, checksum: u16) -> Option<u32> {
        self.values.get(&checksum).copied()
    }
}
