//! Rate side of the engine.
//!
//! The trapezoid generator runs from its own, slower interrupt and owns its
//! state outright. It only touches the step side twice per tick: once to
//! read the active block and its progress, and once to hand back a new rate
//! for the timer. Both exchanges are short, so the step vector is never held
//! up while the rate is recomputed or reported.

use crate::motion::{RateProgram, TrapezoidGenerator};
use crate::planner::Block;

use super::observer::EngineObserver;

/// What the rate side sees of the active block.
#[derive(Clone, Copy)]
pub struct RateSnapshot {
    /// Copy of the active block.
    pub block: Block,
    /// Fixed-point progress through it.
    pub progress: u64,
    /// Sequence number of the block, bumped on every latch.
    pub generation: u32,
}

/// A commanded rate, tagged with the block it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCommand {
    /// Steps per minute before the floor clamp.
    pub rate: u32,
    /// Generation of the block the rate belongs to.
    pub generation: u32,
}

/// Trapezoid state owned by the trapezoid tick handler.
///
/// Speed changes it causes are reported to its own observer, outside any
/// lock on the step side.
#[derive(Debug)]
pub struct RateGenerator<OBS: EngineObserver = ()> {
    trapezoid: TrapezoidGenerator,
    generation: Option<u32>,
    observer: OBS,
}

impl Default for RateGenerator<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<OBS: EngineObserver> RateGenerator<OBS> {
    /// Create a rate generator that has not seen any block yet.
    pub const fn new(observer: OBS) -> Self {
        Self {
            trapezoid: TrapezoidGenerator::new(),
            generation: None,
            observer,
        }
    }

    /// Evolve the commanded rate against `snapshot`.
    ///
    /// A block not seen before resets the generator to its entry rate
    /// first. Returns a command only when the rate changed.
    pub fn tick(&mut self, snapshot: Option<&RateSnapshot>) -> Option<RateCommand> {
        let Some(snapshot) = snapshot else {
            self.generation = None;
            return None;
        };

        if self.generation != Some(snapshot.generation) {
            self.trapezoid.reset(&snapshot.block);
            self.generation = Some(snapshot.generation);
        }

        self.trapezoid
            .tick(&snapshot.block, snapshot.progress)
            .map(|rate| RateCommand {
                rate,
                generation: snapshot.generation,
            })
    }

    /// Report a rate the step side has programmed.
    pub fn report(&mut self, program: RateProgram) {
        self.observer.on_speed_change(program.rate);
    }

    /// Rate being commanded, before the floor clamp.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.trapezoid.rate()
    }

    /// Generation of the block being tracked, if any.
    #[inline]
    pub fn generation(&self) -> Option<u32> {
        self.generation
    }

    /// Get a reference to the observer.
    #[inline]
    pub fn observer(&self) -> &OBS {
        &self.observer
    }

    /// Get a mutable reference to the observer.
    #[inline]
    pub fn observer_mut(&mut self) -> &mut OBS {
        &mut self.observer
    }
}
