//! The pulse engine.
//!
//! Owns the timer, both GPIO banks and the planner queue. All work happens in
//! the interrupt entry points, each of which takes `&mut self` and runs in
//! bounded time without allocating.
//!
//! The trapezoid state is not in here. It lives in a [`RateGenerator`] owned
//! by the trapezoid tick handler, which reads a [`RateSnapshot`] and hands
//! back a [`RateCommand`] for [`StepperEngine::apply_rate`] to program.

use crate::config::{validate_config, EngineConfig};
use crate::error::{EngineError, Error, Result};
use crate::hal::{Channel, GpioBank, StepTimer};
use crate::motion::{FrequencyController, PulseGenerator, RateProgram};
use crate::planner::{Block, BlockQueue, AXES};

use super::observer::EngineObserver;
use super::rate::{RateCommand, RateGenerator, RateSnapshot};
use super::state::EngineState;

/// Step channel reload while idle.
pub const IDLE_STEP_RELOAD: u32 = 10_000;

/// Pulse-reset channel reload while idle.
pub const IDLE_PULSE_RELOAD: u32 = 500;

/// Real-time step pulse engine.
///
/// Generic over:
/// - `TIM`: step timer with step and pulse-reset channels
/// - `STEP`: GPIO bank carrying the step pins
/// - `DIR`: GPIO bank carrying the direction pins
/// - `Q`: planner queue the blocks come from
/// - `OBS`: notification sink (defaults to none)
pub struct StepperEngine<TIM, STEP, DIR, Q, OBS = ()>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
    OBS: EngineObserver,
{
    timer: TIM,
    step_gpio: STEP,
    dir_gpio: DIR,
    queue: Q,
    observer: OBS,

    config: EngineConfig,
    step_mask: u32,
    dir_mask: u32,

    state: EngineState,

    /// Block being stepped, copied out of the queue head at latch time.
    active: Option<Block>,

    /// Bumped on every latch so stale rate commands can be told apart.
    generation: u32,

    pulses: PulseGenerator,
    frequency: FrequencyController,

    /// Axes to pulse on the next step tick, bit n for axis n.
    out_step_bits: u8,

    /// Direction flags to drive on the next step tick.
    out_dir_bits: u8,

    completed_blocks: u32,
}

impl<TIM, STEP, DIR, Q, OBS> StepperEngine<TIM, STEP, DIR, Q, OBS>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
    OBS: EngineObserver,
{
    /// Create an idle engine.
    ///
    /// Programs the idle reloads and enables the step channel interrupt.
    /// The timer stays stopped until [`wake_up`](Self::wake_up).
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        mut timer: TIM,
        step_gpio: STEP,
        dir_gpio: DIR,
        queue: Q,
        observer: OBS,
        config: EngineConfig,
    ) -> Result<Self> {
        validate_config(&config)?;

        timer.stop();
        timer.set_reload(Channel::Step, IDLE_STEP_RELOAD);
        timer.set_reload(Channel::PulseReset, IDLE_PULSE_RELOAD);
        timer.enable_channel(Channel::Step);

        Ok(Self {
            timer,
            step_gpio,
            dir_gpio,
            queue,
            observer,
            step_mask: config.pins.step_mask(),
            dir_mask: config.pins.dir_mask(),
            frequency: FrequencyController::new(&config),
            config,
            state: EngineState::Idle,
            active: None,
            generation: 0,
            pulses: PulseGenerator::new(),
            out_step_bits: 0,
            out_dir_bits: 0,
            completed_blocks: 0,
        })
    }

    /// Shared timer interrupt vector.
    ///
    /// Services a pending pulse-reset match first, then a pending step match.
    pub fn on_timer_interrupt(&mut self) {
        if self.timer.take_pending(Channel::PulseReset) {
            self.on_pulse_reset();
        }
        if self.timer.take_pending(Channel::Step) {
            self.on_step_interrupt();
        }
    }

    /// Pulse-reset match: release every step pin.
    #[inline]
    pub fn on_pulse_reset(&mut self) {
        self.step_gpio.clear_mask(self.step_mask);
    }

    /// Step match: drive the pins latched last tick, then run one DDA tick.
    pub fn on_step_interrupt(&mut self) {
        // Direction settles before the step edge
        self.dir_gpio.clear_mask(self.dir_mask);
        self.step_gpio.clear_mask(self.step_mask);
        self.dir_gpio.set_mask(self.config.pins.dir_bits_for(self.out_dir_bits));
        let step_out = self.config.pins.step_bits_for(self.out_step_bits);
        self.step_gpio.set_mask(step_out);
        self.out_step_bits = 0;

        if self.active.is_none() {
            let next = self.queue.peek_next().copied();
            match next {
                Some(block) => self.begin_block(block),
                None => {
                    self.out_dir_bits = 0;
                    if step_out == 0 {
                        self.go_idle();
                    } else {
                        trace!("idle deferred until step pins release");
                    }
                    return;
                }
            }
        }

        let Some(direction_bits) = self.active.as_ref().map(|block| block.direction_bits) else {
            return;
        };

        self.out_dir_bits = direction_bits;
        self.out_step_bits = self.pulses.advance(self.frequency.divider());

        if self.pulses.is_complete() {
            self.complete_block();
        }
    }

    /// Slow periodic tick, for when both handlers share one context.
    ///
    /// Interrupt-driven setups go through
    /// [`SharedEngine::on_trapezoid_tick`](super::SharedEngine::on_trapezoid_tick)
    /// instead, which keeps the engine unlocked while `rate` works.
    pub fn on_trapezoid_tick<R: EngineObserver>(&mut self, rate: &mut RateGenerator<R>) {
        let snapshot = self.rate_snapshot();
        if let Some(command) = rate.tick(snapshot.as_ref()) {
            if let Some(program) = self.apply_rate(command) {
                rate.report(program);
            }
        }
    }

    /// Active block and progress, as the rate side needs them.
    pub fn rate_snapshot(&self) -> Option<RateSnapshot> {
        self.active.map(|block| RateSnapshot {
            block,
            progress: self.pulses.progress(),
            generation: self.generation,
        })
    }

    /// Program the step timer for a rate computed by the rate side.
    ///
    /// Returns `None` without touching the timer if the block the command
    /// was computed for is no longer active.
    pub fn apply_rate(&mut self, command: RateCommand) -> Option<RateProgram> {
        if self.active.is_none() || command.generation != self.generation {
            trace!("stale rate command dropped");
            return None;
        }
        Some(self.frequency.set_rate(&mut self.timer, command.rate))
    }

    /// Re-arm the step timer after blocks were queued.
    ///
    /// Safe to call at any time; a running engine is left untouched.
    pub fn wake_up(&mut self) {
        self.timer.enable_channel(Channel::Step);
        self.timer.enable_channel(Channel::PulseReset);
        if !self.timer.is_running() {
            trace!("wake up");
            self.timer.start();
        }
    }

    /// Swap in a new configuration between blocks.
    ///
    /// Pins of the old mapping are released before the new masks apply.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Busy` while a block is executing, or a
    /// configuration error if `config` fails validation.
    pub fn reload_config(&mut self, config: EngineConfig) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::Engine(EngineError::Busy));
        }
        validate_config(&config)?;

        self.step_gpio.clear_mask(self.step_mask);
        self.dir_gpio.clear_mask(self.dir_mask);

        self.step_mask = config.pins.step_mask();
        self.dir_mask = config.pins.dir_mask();
        self.frequency.configure(&config);
        if self.timer.is_running() {
            self.timer.set_reload(Channel::PulseReset, self.frequency.pulse_reload());
        }
        self.out_step_bits = 0;
        self.out_dir_bits = 0;
        self.config = config;

        info!(
            "config reloaded: base {=u32}Hz floor {=u32}/min",
            self.config.base_stepping_frequency,
            self.config.minimum_steps_per_minute
        );
        Ok(())
    }

    fn begin_block(&mut self, block: Block) {
        debug!(
            "block begin: {=u32} events, rate {=u32}",
            block.steps_event_count,
            block.initial_rate
        );

        self.pulses.load(&block);
        self.active = Some(block);
        self.generation = self.generation.wrapping_add(1);

        self.transition(EngineState::Active);
        let program = self.frequency.set_rate(&mut self.timer, block.initial_rate);
        self.observer.on_speed_change(program.rate);
        self.observer.on_block_begin(&block);
    }

    fn complete_block(&mut self) {
        let Some(block) = self.active.take() else {
            return;
        };

        self.transition(EngineState::Completing);
        debug!("block end: {=u32} events", block.steps_event_count);

        self.observer.on_block_end(&block);
        if let Some(action) = block.deferred_action {
            action(&block);
        }
        self.queue.discard_head();
        self.completed_blocks = self.completed_blocks.wrapping_add(1);

        self.transition(EngineState::Idle);
    }

    fn go_idle(&mut self) {
        debug!("queue empty, going idle");
        self.timer.disable_channel(Channel::PulseReset);
        self.timer.set_reload(Channel::Step, IDLE_STEP_RELOAD);
        self.timer.set_reload(Channel::PulseReset, IDLE_PULSE_RELOAD);
        self.timer.stop();
    }

    fn transition(&mut self, next: EngineState) {
        debug_assert!(self.state.can_enter(next));
        let previous = core::mem::replace(&mut self.state, next);
        self.observer.on_state_change(previous, next);
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Block being stepped, if any.
    #[inline]
    pub fn active_block(&self) -> Option<&Block> {
        self.active.as_ref()
    }

    /// Pulses emitted for the active block, per axis.
    #[inline]
    pub fn emitted(&self) -> [u32; AXES] {
        self.pulses.emitted()
    }

    /// Fixed-point progress through the active block.
    #[inline]
    pub fn progress(&self) -> u64 {
        self.pulses.progress()
    }

    /// Rate the step timer is programmed for, after the floor clamp.
    #[inline]
    pub fn programmed_rate(&self) -> u32 {
        self.frequency.rate()
    }

    /// Generation of the latest latched block.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Divider currently applied to each step tick.
    #[inline]
    pub fn divider(&self) -> u8 {
        self.frequency.divider()
    }

    /// Blocks finished since creation.
    #[inline]
    pub fn completed_blocks(&self) -> u32 {
        self.completed_blocks
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Period of the trapezoid tick in microseconds.
    #[inline]
    pub fn trapezoid_period_us(&self) -> u32 {
        self.config.trapezoid_period_us()
    }

    /// Get a reference to the step timer.
    #[inline]
    pub fn timer(&self) -> &TIM {
        &self.timer
    }

    /// Get a mutable reference to the step timer.
    #[inline]
    pub fn timer_mut(&mut self) -> &mut TIM {
        &mut self.timer
    }

    /// Get a reference to the step pin bank.
    #[inline]
    pub fn step_gpio(&self) -> &STEP {
        &self.step_gpio
    }

    /// Get a reference to the direction pin bank.
    #[inline]
    pub fn dir_gpio(&self) -> &DIR {
        &self.dir_gpio
    }

    /// Get a reference to the planner queue.
    #[inline]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Get a mutable reference to the planner queue, e.g. to push blocks.
    ///
    /// The head block must not be modified while it executes.
    #[inline]
    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
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

    /// Tear the engine down into its parts.
    pub fn release(self) -> (TIM, STEP, DIR, Q, OBS) {
        (self.timer, self.step_gpio, self.dir_gpio, self.queue, self.observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EventRecorder};
    use crate::hal::sim::{SimGpio, SimTimer};
    use crate::planner::BlockBuffer;

    type TestEngine = StepperEngine<SimTimer, SimGpio, SimGpio, BlockBuffer<4>, EventRecorder<64>>;

    fn config() -> EngineConfig {
        EngineConfig {
            base_stepping_frequency: 1_000,
            timer_clock_hz: 1_000_000,
            ..EngineConfig::default()
        }
    }

    fn engine() -> TestEngine {
        StepperEngine::new(
            SimTimer::new(),
            SimGpio::new(),
            SimGpio::new(),
            BlockBuffer::new(),
            EventRecorder::new(),
            config(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_engine_is_idle_and_stopped() {
        let engine = engine();

        assert_eq!(engine.state(), EngineState::Idle);
        assert!(!engine.timer().is_running());
        assert_eq!(engine.timer().reload(Channel::Step), IDLE_STEP_RELOAD);
        assert_eq!(engine.timer().reload(Channel::PulseReset), IDLE_PULSE_RELOAD);
        assert!(engine.timer().is_channel_enabled(Channel::Step));
        assert!(!engine.timer().is_channel_enabled(Channel::PulseReset));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = StepperEngine::new(
            SimTimer::new(),
            SimGpio::new(),
            SimGpio::new(),
            BlockBuffer::<4>::new(),
            (),
            EngineConfig {
                minimum_steps_per_minute: 0,
                ..config()
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_block_latches_on_first_tick() {
        let mut engine = engine();
        engine
            .queue_mut()
            .push(Block::constant_rate([4, 2, 0], 60_000).with_directions(0b010))
            .unwrap();
        engine.wake_up();

        engine.on_step_interrupt();

        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(engine.programmed_rate(), 60_000);
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.divider(), 0);
        assert_eq!(engine.emitted(), [1, 0, 0]);
        assert_eq!(
            engine.observer().events()[..3],
            [
                EngineEvent::StateChange {
                    from: EngineState::Idle,
                    to: EngineState::Active
                },
                EngineEvent::SpeedChange(60_000),
                EngineEvent::BlockBegin { steps: [4, 2, 0] },
            ]
        );

        // Pins latched on this tick come out on the next one
        assert_eq!(engine.step_gpio().levels(), 0);
        engine.on_step_interrupt();
        assert!(engine.step_gpio().is_high(0));
        assert!(engine.dir_gpio().is_high(4));
        assert!(!engine.dir_gpio().is_high(3));
    }

    #[test]
    fn test_pulse_reset_releases_step_pins() {
        let mut engine = engine();
        engine.queue_mut().push(Block::constant_rate([3, 3, 3], 60_000)).unwrap();
        engine.wake_up();
        engine.on_step_interrupt();
        engine.on_step_interrupt();
        assert_eq!(engine.step_gpio().levels() & 0b111, 0b111);

        engine.on_pulse_reset();

        assert_eq!(engine.step_gpio().levels(), 0);
    }

    #[test]
    fn test_empty_queue_goes_idle() {
        let mut engine = engine();
        engine.wake_up();
        assert!(engine.timer().is_running());

        engine.on_step_interrupt();

        assert!(!engine.timer().is_running());
        assert!(!engine.timer().is_channel_enabled(Channel::PulseReset));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_reload_config_rejected_while_busy() {
        let mut engine = engine();
        engine.queue_mut().push(Block::constant_rate([10, 0, 0], 60_000)).unwrap();
        engine.wake_up();
        engine.on_step_interrupt();

        assert_eq!(
            engine.reload_config(config()),
            Err(Error::Engine(EngineError::Busy))
        );
    }

    #[test]
    fn test_reload_config_moves_pins() {
        let mut engine = engine();
        let mut config = config();
        config.pins.alpha_step_pin = 10;

        engine.reload_config(config).unwrap();
        engine.queue_mut().push(Block::constant_rate([2, 0, 0], 60_000)).unwrap();
        engine.wake_up();
        engine.on_step_interrupt();
        engine.on_step_interrupt();

        assert!(engine.step_gpio().is_high(10));
        assert!(!engine.step_gpio().is_high(0));
    }

    #[test]
    fn test_trapezoid_tick_without_block_is_noop() {
        let mut engine = engine();
        let mut rate = RateGenerator::new(EventRecorder::<8>::new());
        engine.on_trapezoid_tick(&mut rate);

        assert!(engine.rate_snapshot().is_none());
        assert!(engine.observer().events().is_empty());
        assert!(rate.observer().events().is_empty());
        assert_eq!(engine.timer().reload(Channel::Step), IDLE_STEP_RELOAD);
    }

    #[test]
    fn test_stale_rate_command_is_dropped() {
        let mut engine = engine();
        engine.queue_mut().push(Block::constant_rate([1, 0, 0], 60_000)).unwrap();
        engine.queue_mut().push(Block::constant_rate([5, 0, 0], 60_000)).unwrap();
        engine.wake_up();
        // One event at divider 0 completes on the latching tick
        engine.on_step_interrupt();
        let first = engine.generation();
        assert!(engine.rate_snapshot().is_none());

        engine.on_step_interrupt();
        assert_eq!(engine.generation(), first + 1);
        let reload = engine.timer().reload(Channel::Step);

        let stale = RateCommand {
            rate: 6_000,
            generation: first,
        };
        assert_eq!(engine.apply_rate(stale), None);
        assert_eq!(engine.timer().reload(Channel::Step), reload);

        let current = RateCommand {
            rate: 6_000,
            generation: first + 1,
        };
        assert_eq!(engine.apply_rate(current).map(|program| program.rate), Some(6_000));
    }
}
