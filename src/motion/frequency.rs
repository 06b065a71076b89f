//! Step timer frequency selection.
//!
//! A commanded rate in steps per minute is turned into a step-channel reload
//! and a divider. The divider oversamples the step tick by `2^divider` so
//! slow moves still run the DDA near the base stepping frequency; each tick
//! then only advances progress by `ONE >> divider`.

use crate::config::EngineConfig;
use crate::hal::{Channel, StepTimer};

/// Largest divider the search will return.
pub const MAX_DIVIDER: u8 = 16;

/// Ratio between the base stepping frequency and a step rate.
///
/// Kept as an exact fraction `num / den` so the divider search never rounds.
/// Never below one: slower factors are clamped to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedFactor {
    num: u64,
    den: u64,
}

impl SpeedFactor {
    /// Factor for `rate` steps per minute against a `base_hz` tick.
    ///
    /// `rate` must be non-zero; the controller clamps it to the rate floor
    /// before it gets here.
    pub fn new(base_hz: u32, rate: u32) -> Self {
        let den = u64::from(rate.max(1));
        let mut num = u64::from(base_hz) * 60;
        if num < den {
            num = den;
        }
        Self { num, den }
    }

    /// Whether `2^(divider+1)` reaches this factor.
    #[inline]
    pub fn fits(self, divider: u8) -> bool {
        (self.den << (u32::from(divider) + 1)) >= self.num
    }

    /// Whether the factor was clamped to exactly one.
    #[inline]
    pub fn is_unity(self) -> bool {
        self.num == self.den
    }
}

/// Smallest divider whose `2^(divider+1)` reaches `factor`, capped at
/// [`MAX_DIVIDER`].
pub fn divider_for(factor: SpeedFactor) -> u8 {
    let mut divider = 0;
    while divider < MAX_DIVIDER && !factor.fits(divider) {
        divider += 1;
    }
    divider
}

/// Timer settings derived from one commanded rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateProgram {
    /// Rate after the floor clamp, in steps per minute.
    pub rate: u32,
    /// Progress shift per step tick.
    pub divider: u8,
    /// Step channel match value in timer clock ticks.
    pub step_reload: u32,
}

/// Owns the divider and reprograms the step timer on rate changes.
#[derive(Debug, Clone)]
pub struct FrequencyController {
    minimum_rate: u32,
    base_frequency: u32,
    timer_clock: u32,
    pulse_reload: u32,
    divider: u8,
    rate: u32,
}

impl FrequencyController {
    /// Create a controller for `config`. The divider starts at zero.
    pub fn new(config: &EngineConfig) -> Self {
        let mut controller = Self {
            minimum_rate: 0,
            base_frequency: 0,
            timer_clock: 0,
            pulse_reload: 0,
            divider: 0,
            rate: 0,
        };
        controller.configure(config);
        controller
    }

    /// Pick up new configuration values. The current divider is kept.
    pub fn configure(&mut self, config: &EngineConfig) {
        self.minimum_rate = config.minimum_steps_per_minute;
        self.base_frequency = config.base_stepping_frequency;
        self.timer_clock = config.timer_clock_hz;
        self.pulse_reload = config.pulse_reload();
    }

    /// Divider currently in effect.
    #[inline]
    pub fn divider(&self) -> u8 {
        self.divider
    }

    /// Last programmed rate, after clamping.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Pulse-reset channel match value.
    #[inline]
    pub fn pulse_reload(&self) -> u32 {
        self.pulse_reload
    }

    /// Compute the timer settings for `rate` without touching any state.
    pub fn program(&self, rate: u32) -> RateProgram {
        let rate = if rate < self.minimum_rate {
            trace!("rate {=u32} raised to floor {=u32}", rate, self.minimum_rate);
            self.minimum_rate
        } else {
            rate
        };

        let factor = SpeedFactor::new(self.base_frequency, rate);
        let divider = divider_for(factor);
        if !factor.fits(divider) {
            warn!("divider capped at {=u8} for rate {=u32}", divider, rate);
        }

        let ticks_per_minute = u64::from(rate.max(1)) << divider;
        let reload = u64::from(self.timer_clock) * 60 / ticks_per_minute;
        let step_reload = u32::try_from(reload).unwrap_or(u32::MAX).max(1);

        RateProgram {
            rate,
            divider,
            step_reload,
        }
    }

    /// Switch the step timer to `rate` steps per minute.
    ///
    /// Writes the step reload first. If the running counter is already past
    /// it the match would be missed until the counter wraps, so the channel
    /// is reset and restarted.
    pub fn set_rate<T: StepTimer>(&mut self, timer: &mut T, rate: u32) -> RateProgram {
        let program = self.program(rate);

        timer.set_reload(Channel::Step, program.step_reload);
        if timer.read_counter(Channel::Step) >= program.step_reload {
            trace!("counter past reload {=u32}, restarting", program.step_reload);
            timer.reset_channel(Channel::Step);
        }
        timer.set_reload(Channel::PulseReset, self.pulse_reload);

        self.divider = program.divider;
        self.rate = program.rate;
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::SimTimer;

    fn controller() -> FrequencyController {
        FrequencyController::new(&EngineConfig::default())
    }

    #[test]
    fn test_unity_factor_gives_zero_divider() {
        // 100kHz base, 6_000_000 steps/min is exactly 100kHz
        let factor = SpeedFactor::new(100_000, 6_000_000);
        assert!(factor.is_unity());
        assert_eq!(divider_for(factor), 0);

        // Faster than base clamps to one as well
        let factor = SpeedFactor::new(100_000, 12_000_000);
        assert!(factor.is_unity());
        assert_eq!(divider_for(factor), 0);
    }

    #[test]
    fn test_divider_is_smallest_fit() {
        // 100kHz / 1kHz = 100 -> 2^7 = 128 is the first power reaching it
        let factor = SpeedFactor::new(100_000, 60_000);
        assert_eq!(divider_for(factor), 6);
        assert!(factor.fits(6));
        assert!(!factor.fits(5));

        // Exactly 2 fits at divider 0
        assert_eq!(divider_for(SpeedFactor::new(100_000, 3_000_000)), 0);
        // Just over 2 needs divider 1
        assert_eq!(divider_for(SpeedFactor::new(100_000, 2_999_999)), 1);
    }

    #[test]
    fn test_divider_search_is_capped() {
        let factor = SpeedFactor::new(u32::MAX, 1);
        assert_eq!(divider_for(factor), MAX_DIVIDER);
        assert!(!factor.fits(MAX_DIVIDER));
    }

    #[test]
    fn test_rate_below_floor_is_raised() {
        let controller = controller();
        let program = controller.program(10);

        assert_eq!(program.rate, 1200);
        assert_eq!(program, controller.program(1200));
    }

    #[test]
    fn test_step_reload_matches_tick_frequency() {
        let program = controller().program(60_000);

        // 1kHz step rate oversampled by 64: 25MHz / 64kHz
        assert_eq!(program.divider, 6);
        assert_eq!(program.step_reload, 25_000_000 / 64_000);
    }

    #[test]
    fn test_set_rate_programs_both_channels() {
        let mut controller = controller();
        let mut timer = SimTimer::new();

        let program = controller.set_rate(&mut timer, 60_000);

        assert_eq!(timer.reload(Channel::Step), program.step_reload);
        assert_eq!(timer.reload(Channel::PulseReset), 125);
        assert_eq!(controller.divider(), 6);
        assert_eq!(controller.rate(), 60_000);
        assert_eq!(timer.resets(), 0);
    }

    #[test]
    fn test_counter_past_reload_restarts_channel() {
        let mut controller = controller();
        let mut timer = SimTimer::new();
        timer.set_counter(5_000);

        let program = controller.set_rate(&mut timer, 60_000);

        assert!(program.step_reload < 5_000);
        assert_eq!(timer.resets(), 1);
        assert_eq!(timer.counter(), 0);
    }
}
