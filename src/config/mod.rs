//! Configuration module for stepper-pulse.
//!
//! Provides the engine settings, loaded from TOML files (with `std` feature)
//! or from a checksum-keyed [`ConfigSource`].

mod engine;
#[cfg(feature = "std")]
mod loader;
mod pins;
mod source;
mod validation;

pub use engine::EngineConfig;
pub use pins::{PinMap, MAX_PIN, MAX_PORT};
pub use source::{checksum, ConfigKey, ConfigSource, MapSource};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
