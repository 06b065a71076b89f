//! Motion module for stepper-pulse.
//!
//! The three interrupt-side algorithms: pulse distribution, trapezoid rate
//! evolution and timer frequency selection. All arithmetic here is integer;
//! progress and per-axis accumulators carry [`FRACTIONAL_BITS`] fractional
//! bits.

mod frequency;
mod pulse;
mod trapezoid;

pub use frequency::{divider_for, FrequencyController, RateProgram, SpeedFactor, MAX_DIVIDER};
pub use pulse::{step_offset, PulseGenerator};
pub use trapezoid::{RatePhase, TrapezoidGenerator};

/// Fractional bits of the progress counter and axis accumulators.
pub const FRACTIONAL_BITS: u32 = 16;

/// One whole event unit in fixed point.
pub const ONE: u64 = 1 << FRACTIONAL_BITS;

/// Progress added per step tick at a given divider.
#[inline]
pub const fn tick_increment(divider: u8) -> u64 {
    ONE >> divider
}

/// Convert whole event units to fixed point.
#[inline]
pub const fn to_fixed(events: u32) -> u64 {
    (events as u64) << FRACTIONAL_BITS
}
