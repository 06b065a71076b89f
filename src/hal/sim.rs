//! Simulated hardware.
//!
//! Register-level models of the step timer and GPIO banks, used to run the
//! engine off-target and to observe what it did.

use super::{Channel, GpioBank, StepTimer};

/// Step timer model.
///
/// The counter only moves when [`advance`](SimTimer::advance) is called.
/// A step match restarts the counter; a pulse-reset match does not.
#[derive(Debug, Clone, Default)]
pub struct SimTimer {
    reload: [u32; 2],
    counter: u32,
    running: bool,
    enabled: [bool; 2],
    pending: [bool; 2],
    resets: u32,
    reload_writes: u32,
}

impl SimTimer {
    /// Create a stopped timer with both channels disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current match value of a channel.
    #[inline]
    pub fn reload(&self, channel: Channel) -> u32 {
        self.reload[channel.index()]
    }

    /// Current counter value.
    #[inline]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Force the counter, e.g. to put it past a match value.
    pub fn set_counter(&mut self, value: u32) {
        self.counter = value;
    }

    /// Whether a channel's interrupt is enabled.
    #[inline]
    pub fn is_channel_enabled(&self, channel: Channel) -> bool {
        self.enabled[channel.index()]
    }

    /// Whether a channel has an unacknowledged match.
    #[inline]
    pub fn is_pending(&self, channel: Channel) -> bool {
        self.pending[channel.index()]
    }

    /// Number of counter reset-and-restart operations.
    #[inline]
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Number of match value writes.
    #[inline]
    pub fn reload_writes(&self) -> u32 {
        self.reload_writes
    }

    /// Flag a match on `channel` as if the counter had reached it.
    pub fn raise(&mut self, channel: Channel) {
        self.pending[channel.index()] = true;
    }

    /// Run the counter for `ticks` reference clock cycles.
    ///
    /// Returns the number of step matches that fired.
    pub fn advance(&mut self, ticks: u32) -> u32 {
        let mut matches = 0;
        if !self.running {
            return matches;
        }

        for _ in 0..ticks {
            self.counter = self.counter.wrapping_add(1);

            if self.counter == self.reload(Channel::PulseReset)
                && self.is_channel_enabled(Channel::PulseReset)
            {
                self.raise(Channel::PulseReset);
            }

            if self.counter >= self.reload(Channel::Step) {
                self.counter = 0;
                if self.is_channel_enabled(Channel::Step) {
                    self.raise(Channel::Step);
                    matches += 1;
                }
            }
        }

        matches
    }
}

impl StepTimer for SimTimer {
    fn set_reload(&mut self, channel: Channel, value: u32) {
        self.reload[channel.index()] = value;
        self.reload_writes = self.reload_writes.wrapping_add(1);
    }

    fn read_counter(&self, _channel: Channel) -> u32 {
        self.counter
    }

    fn reset_channel(&mut self, _channel: Channel) {
        self.counter = 0;
        self.resets = self.resets.wrapping_add(1);
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn enable_channel(&mut self, channel: Channel) {
        self.enabled[channel.index()] = true;
    }

    fn disable_channel(&mut self, channel: Channel) {
        self.enabled[channel.index()] = false;
    }

    fn take_pending(&mut self, channel: Channel) -> bool {
        core::mem::take(&mut self.pending[channel.index()])
    }
}

/// GPIO bank model tracking levels and rising edges per pin.
#[derive(Debug, Clone, Default)]
pub struct SimGpio {
    levels: u32,
    rising: [u32; 32],
}

impl SimGpio {
    /// Create a bank with every pin low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels of all pins.
    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Whether a pin is high.
    #[inline]
    pub fn is_high(&self, pin: u8) -> bool {
        self.levels & (1 << pin) != 0
    }

    /// Low-to-high transitions seen on a pin.
    #[inline]
    pub fn rising_edges(&self, pin: u8) -> u32 {
        self.rising[usize::from(pin)]
    }
}

impl GpioBank for SimGpio {
    fn set_mask(&mut self, mask: u32) {
        let rising = mask & !self.levels;
        for (pin, count) in self.rising.iter_mut().enumerate() {
            if rising & (1 << pin) != 0 {
                *count += 1;
            }
        }
        self.levels |= mask;
    }

    fn clear_mask(&mut self, mask: u32) {
        self.levels &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpio_counts_rising_edges_only() {
        let mut gpio = SimGpio::new();

        gpio.set_mask(0b101);
        gpio.set_mask(0b001);
        gpio.clear_mask(0b001);
        gpio.set_mask(0b001);

        assert_eq!(gpio.rising_edges(0), 2);
        assert_eq!(gpio.rising_edges(2), 1);
        assert!(gpio.is_high(2));
    }

    #[test]
    fn test_timer_matches_restart_counter() {
        let mut timer = SimTimer::new();
        timer.set_reload(Channel::Step, 10);
        timer.set_reload(Channel::PulseReset, 3);
        timer.enable_channel(Channel::Step);
        timer.enable_channel(Channel::PulseReset);
        timer.start();

        assert_eq!(timer.advance(25), 2);
        assert_eq!(timer.counter(), 5);
        assert!(timer.is_pending(Channel::Step));
        assert!(timer.take_pending(Channel::Step));
        assert!(!timer.is_pending(Channel::Step));
        assert!(!timer.take_pending(Channel::Step));
        assert!(timer.take_pending(Channel::PulseReset));
    }

    #[test]
    fn test_disabled_channel_never_pends() {
        let mut timer = SimTimer::new();
        timer.set_reload(Channel::Step, 10);
        timer.set_reload(Channel::PulseReset, 3);
        timer.enable_channel(Channel::Step);
        timer.start();

        timer.advance(10);

        assert!(timer.is_pending(Channel::Step));
        assert!(!timer.is_pending(Channel::PulseReset));
    }

    #[test]
    fn test_stopped_timer_does_not_count() {
        let mut timer = SimTimer::new();
        timer.set_reload(Channel::Step, 2);
        timer.enable_channel(Channel::Step);

        assert_eq!(timer.advance(10), 0);
        assert_eq!(timer.counter(), 0);
    }
}
