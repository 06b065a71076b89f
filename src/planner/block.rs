//! Motion blocks as handed over by the planner.

use core::fmt;

/// Number of axes driven by the engine.
pub const AXES: usize = 3;

/// One of the three stepper axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// First axis (X on cartesian machines).
    Alpha,
    /// Second axis.
    Beta,
    /// Third axis.
    Gamma,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; AXES] = [Axis::Alpha, Axis::Beta, Axis::Gamma];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::Alpha => 0,
            Axis::Beta => 1,
            Axis::Gamma => 2,
        }
    }

    /// Bit of this axis within [`Block::direction_bits`].
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Action run once when a block finishes, before it leaves the queue.
///
/// Receives the block that just completed. Runs in interrupt context, so it
/// must not block.
pub type DeferredAction = fn(&Block);

/// A unit of motion: per-axis step counts plus a trapezoidal rate profile.
///
/// Rates are in steps per minute. `accelerate_until` and `decelerate_after`
/// are expressed in the same event units as `steps_event_count`.
#[derive(Clone, Copy)]
pub struct Block {
    /// Target pulse count per axis.
    pub steps: [u32; AXES],

    /// Event units spanned by the block; the shared progress denominator.
    pub steps_event_count: u32,

    /// Per-axis direction flags, bit n set means axis n runs reversed.
    pub direction_bits: u8,

    /// Cruise rate.
    pub nominal_rate: u32,

    /// Rate at block entry.
    pub initial_rate: u32,

    /// Rate at block exit.
    pub final_rate: u32,

    /// Rate change applied on every trapezoid tick.
    pub rate_delta: u32,

    /// Progress before which the block accelerates.
    pub accelerate_until: u32,

    /// Progress after which the block decelerates.
    pub decelerate_after: u32,

    /// Runs exactly once on completion.
    pub deferred_action: Option<DeferredAction>,
}

impl Block {
    /// Block moving `steps` at a constant `rate`, with `steps_event_count`
    /// set to the largest axis count.
    pub fn constant_rate(steps: [u32; AXES], rate: u32) -> Self {
        let events = steps.iter().copied().max().unwrap_or(0);
        Self {
            steps,
            steps_event_count: events,
            direction_bits: 0,
            nominal_rate: rate,
            initial_rate: rate,
            final_rate: rate,
            rate_delta: 0,
            accelerate_until: 0,
            decelerate_after: events,
            deferred_action: None,
        }
    }

    /// Set the direction flags.
    pub fn with_directions(mut self, direction_bits: u8) -> Self {
        self.direction_bits = direction_bits;
        self
    }

    /// Attach a completion action.
    pub fn with_deferred_action(mut self, action: DeferredAction) -> Self {
        self.deferred_action = Some(action);
        self
    }

    /// Steps requested on one axis.
    #[inline]
    pub fn steps_on(&self, axis: Axis) -> u32 {
        self.steps[axis.index()]
    }

    /// Whether `axis` runs in the reversed direction.
    #[inline]
    pub fn is_reversed(&self, axis: Axis) -> bool {
        self.direction_bits & axis.bit() != 0
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("steps", &self.steps)
            .field("steps_event_count", &self.steps_event_count)
            .field("direction_bits", &self.direction_bits)
            .field("nominal_rate", &self.nominal_rate)
            .field("initial_rate", &self.initial_rate)
            .field("final_rate", &self.final_rate)
            .field("rate_delta", &self.rate_delta)
            .field("accelerate_until", &self.accelerate_until)
            .field("decelerate_after", &self.decelerate_after)
            .field("deferred_action", &self.deferred_action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rate_uses_longest_axis() {
        let block = Block::constant_rate([10, 40, 25], 6000);

        assert_eq!(block.steps_event_count, 40);
        assert_eq!(block.decelerate_after, 40);
        assert_eq!(block.initial_rate, 6000);
        assert_eq!(block.final_rate, 6000);
    }

    #[test]
    fn test_direction_bits() {
        let block = Block::constant_rate([1, 1, 1], 600).with_directions(0b101);

        assert!(block.is_reversed(Axis::Alpha));
        assert!(!block.is_reversed(Axis::Beta));
        assert!(block.is_reversed(Axis::Gamma));
    }
}
