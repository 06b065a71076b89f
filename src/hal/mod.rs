//! Hardware boundary.
//!
//! The engine drives one timer with two compare-match channels and two GPIO
//! banks. Everything it touches goes through the traits here so the same
//! code runs against real registers or the [`sim`] models.

mod pins;
pub mod sim;

pub use pins::PinGroup;

/// Compare-match channels of the step timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Main channel. Its match fires the step interrupt and restarts the
    /// counter.
    Step,
    /// Secondary channel. Its match releases the step pins; it does not
    /// restart the counter.
    PulseReset,
}

impl Channel {
    /// Both channels.
    pub const ALL: [Channel; 2] = [Channel::Step, Channel::PulseReset];

    /// Array index of this channel.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Step => 0,
            Channel::PulseReset => 1,
        }
    }
}

/// Free-running timer with two compare-match channels.
///
/// All methods are called from interrupt context and must not block.
pub trait StepTimer {
    /// Write a channel's match value.
    fn set_reload(&mut self, channel: Channel, value: u32);

    /// Live counter value as seen by `channel`.
    fn read_counter(&self, channel: Channel) -> u32;

    /// Reset the counter to zero and keep it running.
    fn reset_channel(&mut self, channel: Channel);

    /// Start counting.
    fn start(&mut self);

    /// Stop counting. No further matches fire until [`start`](StepTimer::start).
    fn stop(&mut self);

    /// Whether the counter is running.
    fn is_running(&self) -> bool;

    /// Enable the match interrupt of a channel.
    fn enable_channel(&mut self, channel: Channel);

    /// Disable the match interrupt of a channel.
    fn disable_channel(&mut self, channel: Channel);

    /// Read and clear the pending match flag of a channel.
    fn take_pending(&mut self, channel: Channel) -> bool;
}

/// A GPIO port with atomic masked writes.
pub trait GpioBank {
    /// Drive every pin in `mask` high, leaving the others untouched.
    fn set_mask(&mut self, mask: u32);

    /// Drive every pin in `mask` low, leaving the others untouched.
    fn clear_mask(&mut self, mask: u32);
}

impl<G: GpioBank + ?Sized> GpioBank for &mut G {
    #[inline]
    fn set_mask(&mut self, mask: u32) {
        (**self).set_mask(mask)
    }

    #[inline]
    fn clear_mask(&mut self, mask: u32) {
        (**self).clear_mask(mask)
    }
}
