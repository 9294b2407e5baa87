//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating state transitions. Ledger
//! statuses treat a request for the current state as an idempotent no-op, so
//! the trait distinguishes "moved" from "already there" instead of failing.

use super::ValidationError;

/// Result of applying a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome<S> {
    /// State moved to the contained target.
    Changed(S),
    /// Already in the requested state; nothing to write.
    Unchanged(S),
}

impl<S: Copy> TransitionOutcome<S> {
    /// The state after the request, whether or not it moved.
    pub fn state(&self) -> S {
        match self {
            TransitionOutcome::Changed(s) | TransitionOutcome::Unchanged(s) => *s,
        }
    }

    /// Returns true if the request changed the state.
    pub fn is_changed(&self) -> bool {
        matches!(self, TransitionOutcome::Changed(_))
    }
}

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// let outcome = AccountStatus::Active.apply(AccountStatus::Suspended)?;
/// assert!(outcome.is_changed());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Applies a transition request, treating the current state as a no-op.
    fn apply(&self, target: Self) -> Result<TransitionOutcome<Self>, ValidationError> {
        if *self == target {
            return Ok(TransitionOutcome::Unchanged(target));
        }
        self.transition_to(target).map(TransitionOutcome::Changed)
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Closed,
        Welded,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Door::*;
            matches!((self, target), (Open, Closed) | (Closed, Open) | (Closed, Welded))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Door::*;
            match self {
                Open => vec![Closed],
                Closed => vec![Open, Welded],
                Welded => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(Door::Open.transition_to(Door::Closed), Ok(Door::Closed));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        assert!(Door::Open.transition_to(Door::Welded).is_err());
    }

    #[test]
    fn apply_same_state_is_unchanged() {
        let outcome = Door::Welded.apply(Door::Welded).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged(Door::Welded));
        assert!(!outcome.is_changed());
    }

    #[test]
    fn apply_valid_transition_is_changed() {
        let outcome = Door::Closed.apply(Door::Welded).unwrap();
        assert!(outcome.is_changed());
        assert_eq!(outcome.state(), Door::Welded);
    }

    #[test]
    fn apply_invalid_transition_fails() {
        assert!(Door::Welded.apply(Door::Open).is_err());
    }

    #[test]
    fn is_terminal_reflects_outgoing_transitions() {
        assert!(Door::Welded.is_terminal());
        assert!(!Door::Open.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for door in [Door::Open, Door::Closed, Door::Welded] {
            for target in door.valid_transitions() {
                assert!(door.can_transition_to(&target), "{:?} -> {:?}", door, target);
            }
        }
    }
}
