//! Engine notifications.
//!
//! Observers are called synchronously from interrupt context, so they must
//! be short and must not block.
//!
//! The engine's observer sees the lifecycle and the entry rate of each block.
//! Rate changes made by the trapezoid generator go to the observer of the
//! [`RateGenerator`](super::RateGenerator), from the trapezoid handler.

use heapless::Vec;

use crate::planner::{Block, AXES};

use super::state::EngineState;

/// Receives engine events. Every method defaults to doing nothing.
pub trait EngineObserver {
    /// A block was latched and is about to produce its first tick.
    fn on_block_begin(&mut self, _block: &Block) {}

    /// A block finished. Runs before its deferred action.
    fn on_block_end(&mut self, _block: &Block) {}

    /// The step timer was reprogrammed for `rate` steps per minute.
    fn on_speed_change(&mut self, _rate: u32) {}

    /// The lifecycle moved from `from` to `to`.
    fn on_state_change(&mut self, _from: EngineState, _to: EngineState) {}
}

/// The null observer.
impl EngineObserver for () {}

impl<O: EngineObserver + ?Sized> EngineObserver for &mut O {
    fn on_block_begin(&mut self, block: &Block) {
        (**self).on_block_begin(block)
    }

    fn on_block_end(&mut self, block: &Block) {
        (**self).on_block_end(block)
    }

    fn on_speed_change(&mut self, rate: u32) {
        (**self).on_speed_change(rate)
    }

    fn on_state_change(&mut self, from: EngineState, to: EngineState) {
        (**self).on_state_change(from, to)
    }
}

/// One recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineEvent {
    /// Block begin, with the block's step counts.
    BlockBegin {
        /// Requested steps per axis.
        steps: [u32; AXES],
    },
    /// Block end, with the block's step counts.
    BlockEnd {
        /// Requested steps per axis.
        steps: [u32; AXES],
    },
    /// Timer reprogrammed.
    SpeedChange(u32),
    /// Lifecycle transition.
    StateChange {
        /// Previous state.
        from: EngineState,
        /// New state.
        to: EngineState,
    },
}

/// Observer that keeps the first `N` events.
///
/// Later events are counted but not stored.
#[derive(Debug, Default)]
pub struct EventRecorder<const N: usize> {
    events: Vec<EngineEvent, N>,
    dropped: u32,
}

impl<const N: usize> EventRecorder<N> {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded events, oldest first.
    #[inline]
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Events that did not fit.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// State transitions in order.
    pub fn transitions(&self) -> impl Iterator<Item = (EngineState, EngineState)> + '_ {
        self.events.iter().filter_map(|event| match *event {
            EngineEvent::StateChange { from, to } => Some((from, to)),
            _ => None,
        })
    }

    /// Rates reported by speed-change events, in order.
    pub fn rates(&self) -> impl Iterator<Item = u32> + '_ {
        self.events.iter().filter_map(|event| match *event {
            EngineEvent::SpeedChange(rate) => Some(rate),
            _ => None,
        })
    }

    fn record(&mut self, event: EngineEvent) {
        if self.events.push(event).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }
}

impl<const N: usize> EngineObserver for EventRecorder<N> {
    fn on_block_begin(&mut self, block: &Block) {
        self.record(EngineEvent::BlockBegin { steps: block.steps });
    }

    fn on_block_end(&mut self, block: &Block) {
        self.record(EngineEvent::BlockEnd { steps: block.steps });
    }

    fn on_speed_change(&mut self, rate: u32) {
        self.record(EngineEvent::SpeedChange(rate));
    }

    fn on_state_change(&mut self, from: EngineState, to: EngineState) {
        self.record(EngineEvent::StateChange { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let block = Block::constant_rate([1, 2, 3], 600);

        recorder.on_state_change(EngineState::Idle, EngineState::Active);
        recorder.on_speed_change(600);
        recorder.on_block_begin(&block);

        assert_eq!(
            recorder.events(),
            &[
                EngineEvent::StateChange {
                    from: EngineState::Idle,
                    to: EngineState::Active
                },
                EngineEvent::SpeedChange(600),
                EngineEvent::BlockBegin { steps: [1, 2, 3] },
            ]
        );
    }

    #[test]
    fn test_recorder_counts_overflow() {
        let mut recorder: EventRecorder<2> = EventRecorder::new();
        for rate in 0..5 {
            recorder.on_speed_change(rate);
        }

        let rates: Vec<u32, 2> = recorder.rates().collect();
        assert_eq!(rates.as_slice(), &[0, 1]);
        assert_eq!(recorder.dropped(), 3);

        recorder.clear();
        assert!(recorder.events().is_empty());
        assert_eq!(recorder.dropped(), 0);
    }

    #[test]
    fn test_forwarding_through_reference() {
        fn notify<O: EngineObserver>(mut observer: O) {
            observer.on_speed_change(1200);
        }

        let mut recorder: EventRecorder<4> = EventRecorder::new();
        notify(&mut recorder);

        assert_eq!(recorder.events(), &[EngineEvent::SpeedChange(1200)]);
    }
}
