//! Context handed to transition functions.

use crate::core::{State, Trigger};
use crate::machine::engine::Shared;
use std::fmt;
use std::sync::Arc;

/// What a transition function sees of the machine.
///
/// `state`, `payload` and `is_blocked` are a snapshot taken before the
/// trigger started executing. [`transition`](Self::transition) commits to the
/// live machine immediately, even from inside an asynchronous function.
pub struct TransitionContext<S: State, T: Trigger> {
    shared: Arc<Shared<S, T>>,
    state: S,
    blocked: bool,
}

impl<S: State, T: Trigger> TransitionContext<S, T> {
    pub(crate) fn new(shared: Arc<Shared<S, T>>, state: S, blocked: bool) -> Self {
        Self {
            shared,
            state,
            blocked,
        }
    }

    /// State the trigger was invoked in.
    pub fn state(&self) -> S::Kind {
        self.state.kind()
    }

    /// State value, with its payload, the trigger was invoked in.
    pub fn payload(&self) -> &S {
        &self.state
    }

    /// Blocked flag as it was before this trigger started.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Commit `next` as the machine's current state and notify listeners.
    ///
    /// Each call emits one transition-done event; when called several times
    /// the last call decides the resulting state.
    pub fn transition(&self, next: S) {
        self.shared.commit(next);
    }

    /// All declared states, in declaration order.
    pub fn all_states(&self) -> Vec<S::Kind> {
        self.shared.registry().states()
    }
}

impl<S: State, T: Trigger> Clone for TransitionContext<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            state: self.state.clone(),
            blocked: self.blocked,
        }
    }
}

impl<S: State, T: Trigger> fmt::Debug for TransitionContext<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionContext")
            .field("state", &self.state)
            .field("blocked", &self.blocked)
            .finish_non_exhaustive()
    }
}
