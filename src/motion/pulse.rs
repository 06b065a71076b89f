//! Per-axis pulse distribution.
//!
//! Each axis owns a fixed-point accumulator that grows by the same amount
//! as the block's progress every step tick. Whenever it reaches the axis
//! threshold (the event span between two pulses) the axis steps and the
//! threshold is subtracted back out. Over the whole block this spreads
//! exactly `steps[axis]` pulses as evenly as the tick grid allows.

use crate::planner::{Axis, Block, AXES};

use super::{tick_increment, to_fixed, FRACTIONAL_BITS};

/// Fixed-point event span between two pulses of an axis.
///
/// Zero-step axes have no threshold and never step.
#[inline]
pub fn step_offset(steps_event_count: u32, steps: u32) -> Option<u64> {
    if steps == 0 {
        return None;
    }
    Some((u64::from(steps_event_count) << FRACTIONAL_BITS) / u64::from(steps))
}

/// Execution state of the block being stepped.
#[derive(Debug, Clone, Default)]
pub struct PulseGenerator {
    counters: [u64; AXES],
    offsets: [Option<u64>; AXES],
    emitted: [u32; AXES],
    steps: [u32; AXES],
    progress: u64,
    target: u64,
}

impl PulseGenerator {
    /// Create an empty generator.
    pub const fn new() -> Self {
        Self {
            counters: [0; AXES],
            offsets: [None; AXES],
            emitted: [0; AXES],
            steps: [0; AXES],
            progress: 0,
            target: 0,
        }
    }

    /// Latch a new block: compute thresholds and zero every counter.
    pub fn load(&mut self, block: &Block) {
        for axis in Axis::ALL {
            let i = axis.index();
            self.offsets[i] = step_offset(block.steps_event_count, block.steps_on(axis));
            self.counters[i] = 0;
            self.emitted[i] = 0;
        }
        self.steps = block.steps;
        self.progress = 0;
        self.target = to_fixed(block.steps_event_count);
    }

    /// Run one step tick at `divider`.
    ///
    /// Returns the axes that step on this tick, bit n for axis n.
    pub fn advance(&mut self, divider: u8) -> u8 {
        let increment = tick_increment(divider);
        let mut stepped = 0;

        for axis in Axis::ALL {
            let i = axis.index();
            let Some(offset) = self.offsets[i] else {
                continue;
            };

            self.counters[i] += increment;
            if self.counters[i] >= offset && self.emitted[i] < self.steps[i] {
                self.counters[i] -= offset;
                self.emitted[i] += 1;
                stepped |= axis.bit();
            }
        }

        self.progress += increment;
        stepped
    }

    /// Progress has covered the block and every axis got all of its pulses.
    pub fn is_complete(&self) -> bool {
        self.progress >= self.target && self.emitted == self.steps
    }

    /// Fixed-point progress through the block.
    #[inline]
    pub fn progress(&self) -> u64 {
        self.progress
    }

    /// Pulses emitted so far, per axis.
    #[inline]
    pub fn emitted(&self) -> [u32; AXES] {
        self.emitted
    }

    /// Pulse threshold of one axis.
    #[inline]
    pub fn offset(&self, axis: Axis) -> Option<u64> {
        self.offsets[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::ONE;

    fn run(block: &Block, divider: u8) -> (PulseGenerator, u32) {
        let mut pulses = PulseGenerator::new();
        pulses.load(block);
        let mut ticks = 0;
        while !pulses.is_complete() {
            pulses.advance(divider);
            ticks += 1;
            assert!(ticks <= 1 << 24, "block never completed");
        }
        (pulses, ticks)
    }

    #[test]
    fn test_offset_formula() {
        assert_eq!(step_offset(100, 100), Some(ONE));
        assert_eq!(step_offset(100, 50), Some(2 * ONE));
        // floor(65536 * 7 / 3)
        assert_eq!(step_offset(7, 3), Some(152_917));
        assert_eq!(step_offset(100, 0), None);
    }

    #[test]
    fn test_equal_axes_step_every_tick() {
        let block = Block::constant_rate([100, 100, 100], 6000);
        let mut pulses = PulseGenerator::new();
        pulses.load(&block);

        for tick in 1..=100u32 {
            assert_eq!(pulses.advance(0), 0b111);
            assert_eq!(pulses.emitted(), [tick; 3]);
        }
        assert!(pulses.is_complete());
    }

    #[test]
    fn test_zero_step_axis_never_steps() {
        let mut block = Block::constant_rate([0, 50, 50], 6000);
        block.steps_event_count = 100;

        let (pulses, ticks) = run(&block, 0);

        assert_eq!(ticks, 100);
        assert_eq!(pulses.emitted(), [0, 50, 50]);
        assert_eq!(pulses.offset(Axis::Alpha), None);
    }

    #[test]
    fn test_uneven_ratio_lands_on_last_tick() {
        let mut block = Block::constant_rate([3, 7, 5], 6000);
        block.steps_event_count = 7;

        let (pulses, ticks) = run(&block, 0);

        assert_eq!(ticks, 7);
        assert_eq!(pulses.emitted(), [3, 7, 5]);
    }

    #[test]
    fn test_divider_scales_tick_count() {
        let block = Block::constant_rate([10, 4, 0], 6000);

        let (pulses, ticks) = run(&block, 3);

        assert_eq!(ticks, 10 * 8);
        assert_eq!(pulses.emitted(), [10, 4, 0]);
        assert_eq!(pulses.progress(), to_fixed(10));
    }

    #[test]
    fn test_progress_alone_does_not_complete() {
        // More steps than events: one pulse per tick at most, so the
        // axis lags behind progress
        let mut block = Block::constant_rate([4, 0, 0], 6000);
        block.steps_event_count = 2;

        let mut pulses = PulseGenerator::new();
        pulses.load(&block);
        pulses.advance(0);
        pulses.advance(0);

        assert!(pulses.progress() >= to_fixed(2));
        assert!(!pulses.is_complete());

        pulses.advance(0);
        pulses.advance(0);
        assert!(pulses.is_complete());
        assert_eq!(pulses.emitted(), [4, 0, 0]);
    }

    #[test]
    fn test_empty_block_completes_immediately() {
        let block = Block::constant_rate([0, 0, 0], 6000);
        let mut pulses = PulseGenerator::new();
        pulses.load(&block);

        assert!(pulses.is_complete());
    }
}
