//! # stepper-pulse
//!
//! Interrupt-driven step pulse engine for three synchronized stepper axes.
//!
//! ## Features
//!
//! - **Fixed-point DDA**: per-axis 16.16 accumulators spread each axis' pulses
//!   evenly over a block, with exact pulse counts
//! - **Trapezoid rate generator**: accelerate, cruise and decelerate phases
//!   driven from a slow periodic tick
//! - **Live timer reprogramming**: divider oversampling for slow moves and
//!   safe reload writes against a running counter
//! - **no_std compatible**: no allocation, bounded work per interrupt
//! - **Hardware behind traits**: runs against real registers, embedded-hal
//!   pins, or the included simulation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_pulse::{Block, BlockBuffer, EngineConfig, RateGenerator, StepperEngine};
//!
//! let config: EngineConfig = stepper_pulse::load_config("engine.toml")?;
//!
//! let mut engine = StepperEngine::new(timer, step_port, dir_port, BlockBuffer::<16>::new(), (), config)?;
//!
//! engine.queue_mut().push(Block::constant_rate([800, 400, 0], 12_000))?;
//! engine.wake_up();
//!
//! // From the timer vector:
//! engine.on_timer_interrupt();
//! // From the trapezoid ticker, which owns the rate state:
//! let mut rate = RateGenerator::new(());
//! engine.on_trapezoid_tick(&mut rate);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Logging shims must come first so every module sees the macros
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod hal;
pub mod motion;
pub mod planner;

// Re-exports for ergonomic API
pub use config::{validate_config, ConfigKey, ConfigSource, EngineConfig, MapSource, PinMap};
pub use engine::{
    EngineEvent, EngineObserver, EngineState, EventRecorder, RateGenerator, SharedEngine,
    StepperEngine, StepperEngineBuilder,
};
pub use error::{Error, Result};
pub use hal::{Channel, GpioBank, PinGroup, StepTimer};
pub use motion::{FrequencyController, PulseGenerator, RatePhase, TrapezoidGenerator};
pub use planner::{Axis, Block, BlockBuffer, BlockQueue, DeferredAction};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
