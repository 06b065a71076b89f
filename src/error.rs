//! Error types for stepper-pulse.
//!
//! Errors only surface from setup paths (configuration loading, validation,
//! queueing, engine installation). The interrupt handlers never fail: every
//! out-of-range input there is clamped in place.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-pulse operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Engine setup or queueing error
    Engine(EngineError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// A frequency, rate floor or clock setting is zero
    InvalidFrequency(&'static str),
    /// GPIO port index out of range (valid ports: 0-4)
    InvalidPort(u8),
    /// GPIO pin index out of range (valid pins: 0-31)
    InvalidPin(u8),
    /// The same pin is assigned twice within one port
    DuplicatePin(u8),
    /// Step pulse hold time does not fit inside one step period
    PulseTooLong {
        /// Configured pulse hold in microseconds
        pulse_us: u32,
        /// Shortest step period in microseconds
        period_us: u32,
    },
    /// Base stepping frequency exceeds the timer reference clock
    ClockTooSlow {
        /// Timer reference clock in Hz
        clock_hz: u32,
        /// Requested base stepping frequency in Hz
        base_hz: u32,
    },
    /// In-memory configuration source has no room for another key
    SourceFull,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Engine setup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// No engine has been installed in the shared handle
    NotInstalled,
    /// Operation not permitted while a block is executing
    Busy,
    /// Block queue is full
    QueueFull,
    /// A required engine part was not supplied to the builder
    MissingPart(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidFrequency(field) => write!(f, "Invalid {}: must be > 0", field),
            ConfigError::InvalidPort(v) => write!(f, "Invalid GPIO port: {}. Valid ports: 0-4", v),
            ConfigError::InvalidPin(v) => write!(f, "Invalid GPIO pin: {}. Valid pins: 0-31", v),
            ConfigError::DuplicatePin(v) => write!(f, "GPIO pin {} assigned more than once", v),
            ConfigError::PulseTooLong { pulse_us, period_us } => {
                write!(f, "Step pulse of {}us does not fit in a {}us step period", pulse_us, period_us)
            }
            ConfigError::ClockTooSlow { clock_hz, base_hz } => {
                write!(f, "Timer clock {}Hz is slower than base stepping frequency {}Hz", clock_hz, base_hz)
            }
            ConfigError::SourceFull => write!(f, "Configuration source is full"),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotInstalled => write!(f, "Engine not installed"),
            EngineError::Busy => write!(f, "Engine is executing a block"),
            EngineError::QueueFull => write!(f, "Block queue is full"),
            EngineError::MissingPart(part) => write!(f, "Missing engine part: {}", part),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Engine(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
