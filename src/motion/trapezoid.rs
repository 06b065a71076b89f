//! Trapezoid rate generator.
//!
//! Runs on the slow periodic tick and walks the commanded step rate through
//! the accelerate, cruise and decelerate phases of the active block.

use crate::planner::Block;

use super::to_fixed;

/// Velocity phase of a block at a given progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RatePhase {
    /// Rate rises toward the nominal rate.
    Accelerating,
    /// Rate held at the nominal rate.
    Cruising,
    /// Rate falls toward the final rate.
    Decelerating,
}

impl RatePhase {
    /// Phase of `block` at fixed-point `progress`.
    pub fn at(block: &Block, progress: u64) -> Self {
        if progress < to_fixed(block.accelerate_until) {
            RatePhase::Accelerating
        } else if progress > to_fixed(block.decelerate_after) {
            RatePhase::Decelerating
        } else {
            RatePhase::Cruising
        }
    }
}

/// Commanded-rate state for the active block.
#[derive(Debug, Clone)]
pub struct TrapezoidGenerator {
    rate: u32,
    ticks: u32,
    phase: RatePhase,
}

impl Default for TrapezoidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrapezoidGenerator {
    /// Create a generator at rest.
    pub const fn new() -> Self {
        Self {
            rate: 0,
            ticks: 0,
            phase: RatePhase::Accelerating,
        }
    }

    /// Start over for a new block. Returns the entry rate.
    pub fn reset(&mut self, block: &Block) -> u32 {
        self.rate = block.initial_rate;
        self.ticks = 0;
        self.phase = RatePhase::at(block, 0);
        self.rate
    }

    /// Evolve the rate by one tick at `progress`.
    ///
    /// Returns the new rate if it changed.
    pub fn tick(&mut self, block: &Block, progress: u64) -> Option<u32> {
        self.ticks = self.ticks.wrapping_add(1);
        self.phase = RatePhase::at(block, progress);

        let rate = match self.phase {
            RatePhase::Accelerating => self
                .rate
                .saturating_add(block.rate_delta)
                .min(block.nominal_rate),
            RatePhase::Decelerating => {
                // Only step down while it cannot wrap; rounding at the block
                // tail can leave the rate within one delta of zero
                let mut rate = self.rate;
                if rate > block.rate_delta {
                    rate -= block.rate_delta;
                }
                rate.max(block.final_rate)
            }
            RatePhase::Cruising => block.nominal_rate,
        };

        if rate == self.rate {
            return None;
        }
        self.rate = rate;
        Some(rate)
    }

    /// Current commanded rate in steps per minute.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Ticks since the block started.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Phase seen on the last tick.
    #[inline]
    pub fn phase(&self) -> RatePhase {
        self.phase
    }
}
