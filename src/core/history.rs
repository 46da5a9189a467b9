//! Event records and transition history.
//!
//! Records are the values delivered to hooks and bus subscribers. The engine
//! also keeps every committed [`TransitionRecord`] in a [`StateHistory`].

use super::state::{State, Trigger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed transition.
///
/// `from` and `to` are full state values, so the record carries both the
/// state names and their payloads.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{State, TransitionRecord};
/// use stepwise::machine_states;
///
/// machine_states! {
///     enum Task => TaskKind {
///         Pending,
///         Running { worker: u32 },
///     }
/// }
///
/// let record = TransitionRecord::new(Task::Pending, Task::Running { worker: 7 });
/// assert_eq!(record.from_state(), TaskKind::Pending);
/// assert_eq!(record.to_state(), TaskKind::Running);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State> {
    /// The state (and payload) being left
    pub from: S,
    /// The state (and payload) being entered
    pub to: S,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

impl<S: State> TransitionRecord<S> {
    /// Create a record stamped with the current time.
    pub fn new(from: S, to: S) -> Self {
        Self {
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    pub fn from_state(&self) -> S::Kind {
        self.from.kind()
    }

    pub fn to_state(&self) -> S::Kind {
        self.to.kind()
    }
}

/// Record of an accepted trigger invocation.
///
/// Emitted after the guard passed and before the transition function runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TriggerRecord<S: State, T: Trigger> {
    /// State (and payload) the trigger was invoked in
    pub state: S,
    /// Trigger (and arguments) that was invoked
    pub trigger: T,
    /// When the invocation was accepted
    pub timestamp: DateTime<Utc>,
}

impl<S: State, T: Trigger> TriggerRecord<S, T> {
    pub fn new(state: S, trigger: T) -> Self {
        Self {
            state,
            trigger,
            timestamp: Utc::now(),
        }
    }

    pub fn state_kind(&self) -> S::Kind {
        self.state.kind()
    }

    pub fn trigger_kind(&self) -> T::Kind {
        self.trigger.kind()
    }
}

/// Ordered history of committed transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<TransitionRecord<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a committed transition.
    pub fn record(&mut self, transition: TransitionRecord<S>) {
        self.transitions.push(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns references to states in order: the `from` state of the first
    /// transition, then the `to` state of each transition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stepwise::core::{StateHistory, TransitionRecord};
    /// use stepwise::machine_states;
    ///
    /// machine_states! {
    ///     enum Phase => PhaseKind { One, Two, Three }
    /// }
    ///
    /// let mut history = StateHistory::new();
    /// history.record(TransitionRecord::new(Phase::One, Phase::Two));
    /// history.record(TransitionRecord::new(Phase::Two, Phase::Three));
    ///
    /// let path = history.get_path();
    /// assert_eq!(path, vec![&Phase::One, &Phase::Two, &Phase::Three]);
    /// ```
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Duration from first to last transition, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord<S>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
