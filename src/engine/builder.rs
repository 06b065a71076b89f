//! Builder pattern for StepperEngine.

use crate::config::EngineConfig;
use crate::error::{EngineError, Error, Result};
use crate::hal::{GpioBank, StepTimer};
use crate::planner::BlockQueue;

use super::driver::StepperEngine;
use super::observer::EngineObserver;

/// Builder for creating StepperEngine instances.
pub struct StepperEngineBuilder<TIM, STEP, DIR, Q, OBS = ()>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
    OBS: EngineObserver,
{
    timer: Option<TIM>,
    step_gpio: Option<STEP>,
    dir_gpio: Option<DIR>,
    queue: Option<Q>,
    observer: OBS,
    config: EngineConfig,
}

impl<TIM, STEP, DIR, Q> Default for StepperEngineBuilder<TIM, STEP, DIR, Q>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<TIM, STEP, DIR, Q> StepperEngineBuilder<TIM, STEP, DIR, Q>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
{
    /// Create a new builder with the default configuration and no observer.
    pub fn new() -> Self {
        Self {
            timer: None,
            step_gpio: None,
            dir_gpio: None,
            queue: None,
            observer: (),
            config: EngineConfig::default(),
        }
    }
}

impl<TIM, STEP, DIR, Q, OBS> StepperEngineBuilder<TIM, STEP, DIR, Q, OBS>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
    OBS: EngineObserver,
{
    /// Set the step timer.
    pub fn timer(mut self, timer: TIM) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Set the GPIO bank carrying the step pins.
    pub fn step_gpio(mut self, gpio: STEP) -> Self {
        self.step_gpio = Some(gpio);
        self
    }

    /// Set the GPIO bank carrying the direction pins.
    pub fn dir_gpio(mut self, gpio: DIR) -> Self {
        self.dir_gpio = Some(gpio);
        self
    }

    /// Set the planner queue.
    pub fn queue(mut self, queue: Q) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the observer.
    pub fn observer<O: EngineObserver>(self, observer: O) -> StepperEngineBuilder<TIM, STEP, DIR, Q, O> {
        StepperEngineBuilder {
            timer: self.timer,
            step_gpio: self.step_gpio,
            dir_gpio: self.dir_gpio,
            queue: self.queue,
            observer,
            config: self.config,
        }
    }

    /// Build the StepperEngine.
    ///
    /// # Errors
    ///
    /// Returns an error if a hardware part or the queue is missing, or if the
    /// configuration fails validation.
    pub fn build(self) -> Result<StepperEngine<TIM, STEP, DIR, Q, OBS>> {
        let timer = self.timer.ok_or(Error::Engine(EngineError::MissingPart("timer")))?;
        let step_gpio = self
            .step_gpio
            .ok_or(Error::Engine(EngineError::MissingPart("step_gpio")))?;
        let dir_gpio = self
            .dir_gpio
            .ok_or(Error::Engine(EngineError::MissingPart("dir_gpio")))?;
        let queue = self.queue.ok_or(Error::Engine(EngineError::MissingPart("queue")))?;

        StepperEngine::new(timer, step_gpio, dir_gpio, queue, self.observer, self.config)
    }
}
