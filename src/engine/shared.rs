//! Interrupt-safe handle to an engine.
//!
//! Interrupt vectors cannot take arguments, so the engine has to live
//! somewhere they can reach. [`SharedEngine`] is that place: a `static`
//! slot guarded by a critical section, installed once from `main`.
//!
//! The slot holds the step side only. The trapezoid handler keeps its
//! [`RateGenerator`] to itself and enters the slot twice per tick, once to
//! read a snapshot and once to program the new rate. Everything else it does
//! runs with interrupts enabled. Give the step timer vector a higher
//! priority than the trapezoid ticker so it can preempt it.
//!
//! ```rust,ignore
//! static ENGINE: SharedEngine<MyEngine> = SharedEngine::new();
//!
//! // Higher priority
//! #[interrupt]
//! fn TIMER0() {
//!     ENGINE.on_timer_interrupt().ok();
//! }
//!
//! // Lower priority
//! #[interrupt]
//! fn TIMER3() {
//!     static mut RATE: RateGenerator = RateGenerator::new(());
//!     ENGINE.on_trapezoid_tick(RATE).ok();
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::{EngineError, Error, Result};
use crate::hal::{GpioBank, StepTimer};
use crate::planner::BlockQueue;

use super::driver::StepperEngine;
use super::observer::EngineObserver;
use super::rate::RateGenerator;

/// Critical-section protected slot holding at most one engine.
pub struct SharedEngine<E> {
    slot: Mutex<RefCell<Option<E>>>,
}

impl<E> Default for SharedEngine<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SharedEngine<E> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Put `engine` in the slot, returning whatever was there before.
    pub fn install(&self, engine: E) -> Option<E> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).replace(engine))
    }

    /// Remove the engine from the slot.
    pub fn take(&self) -> Option<E> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take())
    }

    /// Whether an engine is installed.
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow_ref(cs).is_some())
    }

    /// Run `f` on the engine inside a critical section.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotInstalled` if the slot is empty.
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> Result<R> {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            let engine = slot
                .as_mut()
                .ok_or(Error::Engine(EngineError::NotInstalled))?;
            Ok(f(engine))
        })
    }
}

impl<TIM, STEP, DIR, Q, OBS> SharedEngine<StepperEngine<TIM, STEP, DIR, Q, OBS>>
where
    TIM: StepTimer,
    STEP: GpioBank,
    DIR: GpioBank,
    Q: BlockQueue,
    OBS: EngineObserver,
{
    /// Forward the shared timer vector.
    pub fn on_timer_interrupt(&self) -> Result<()> {
        self.with(|engine| engine.on_timer_interrupt())
    }

    /// Run the trapezoid tick against the shared engine.
    ///
    /// The engine is locked only to take the snapshot and to program the
    /// timer. The rate update and its report run outside the lock.
    pub fn on_trapezoid_tick<R: EngineObserver>(&self, rate: &mut RateGenerator<R>) -> Result<()> {
        let snapshot = self.with(|engine| engine.rate_snapshot())?;
        let Some(command) = rate.tick(snapshot.as_ref()) else {
            return Ok(());
        };

        if let Some(program) = self.with(|engine| engine.apply_rate(command))? {
            rate.report(program);
        }
        Ok(())
    }

    /// Forward a wake-up request.
    pub fn wake_up(&self) -> Result<()> {
        self.with(|engine| engine.wake_up())
    }
}
