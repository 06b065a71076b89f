//! Block lifecycle states.

/// Where the engine is in the life of a block.
///
/// The only legal cycle is `Idle -> Active -> Completing -> Idle`.
/// `Completing` is transient: it is entered and left inside the step tick
/// that detects completion, while block-end handling runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// No block latched.
    #[default]
    Idle,
    /// A block is being stepped.
    Active,
    /// The block finished and is being handed back.
    Completing,
}

impl EngineState {
    /// State name for display/debugging.
    pub const fn name(self) -> &'static str {
        match self {
            EngineState::Idle => "Idle",
            EngineState::Active => "Active",
            EngineState::Completing => "Completing",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub const fn can_enter(self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (EngineState::Idle, EngineState::Active)
                | (EngineState::Active, EngineState::Completing)
                | (EngineState::Completing, EngineState::Idle)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_forward_cycle_is_legal() {
        assert!(EngineState::Idle.can_enter(EngineState::Active));
        assert!(EngineState::Active.can_enter(EngineState::Completing));
        assert!(EngineState::Completing.can_enter(EngineState::Idle));

        assert!(!EngineState::Idle.can_enter(EngineState::Completing));
        assert!(!EngineState::Active.can_enter(EngineState::Idle));
        assert!(!EngineState::Active.can_enter(EngineState::Active));
    }
}
