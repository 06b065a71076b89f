//! Engine module for stepper-pulse.
//!
//! Ties the motion algorithms to the hardware traits and the planner queue,
//! and exposes the interrupt entry points.

mod builder;
mod driver;
mod observer;
mod rate;
mod shared;
mod state;

pub use builder::StepperEngineBuilder;
pub use driver::{StepperEngine, IDLE_PULSE_RELOAD, IDLE_STEP_RELOAD};
pub use observer::{EngineEvent, EngineObserver, EventRecorder};
pub use rate::{RateCommand, RateGenerator, RateSnapshot};
pub use shared::SharedEngine;
pub use state::EngineState;
