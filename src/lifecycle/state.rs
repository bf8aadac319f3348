//! Server lifecycle state machine.
//!
//! One process-wide instance tracks the state
//! `Uninitialized → Initializing → Serving → ShuttingDown → Stopped`.
//! Transitions are strictly one-directional; there is no restart-in-place.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initializing = 1,
    Serving = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl LifecycleState {
    fn from_u8(value: u8) -> LifecycleState {
        match value {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Serving,
            3 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Stopped,
        }
    }
}

/// Error type for illegal transitions.
#[derive(Debug, thiserror::Error)]
#[error("illegal lifecycle transition: {from:?} → {to:?}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Thread-safe, forward-only lifecycle tracker.
pub struct LifecycleTracker {
    state: AtomicU8,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
        }
    }

    pub fn current(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Advance to the next state. Only the immediate successor is legal.
    pub fn advance(&self, to: LifecycleState) -> Result<(), TransitionError> {
        let expected = (to as u8).wrapping_sub(1);
        match self.state.compare_exchange(
            expected,
            to as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                tracing::debug!(state = ?to, "Lifecycle transition");
                Ok(())
            }
            Err(actual) => Err(TransitionError {
                from: LifecycleState::from_u8(actual),
                to,
            }),
        }
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_forward_only() {
        let tracker = LifecycleTracker::new();
        assert_eq!(tracker.current(), LifecycleState::Uninitialized);

        tracker.advance(LifecycleState::Initializing).unwrap();
        tracker.advance(LifecycleState::Serving).unwrap();

        // Going backwards is illegal.
        assert!(tracker.advance(LifecycleState::Initializing).is_err());
        // Skipping ahead is illegal.
        assert!(tracker.advance(LifecycleState::Stopped).is_err());

        tracker.advance(LifecycleState::ShuttingDown).unwrap();
        tracker.advance(LifecycleState::Stopped).unwrap();
        assert_eq!(tracker.current(), LifecycleState::Stopped);
    }
}
