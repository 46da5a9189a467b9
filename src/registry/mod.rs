//! Declaration registry: which triggers are valid in which state, and what
//! they do.
//!
//! A registry is declared once with [`RegistryBuilder`] and moved into the
//! machine, which never replaces it. Enumeration follows declaration order.
//!
//! # Example
//!
//! ```rust
//! use stepwise::registry::Registry;
//! use stepwise::{machine_states, machine_triggers};
//!
//! machine_states! {
//!     pub enum Door => DoorKind { Closed, Open }
//! }
//!
//! machine_triggers! {
//!     pub enum DoorTrigger => DoorTriggerKind { Push, Pull }
//! }
//!
//! let registry = Registry::<Door, DoorTrigger>::builder()
//!     .state(DoorKind::Closed, |t| {
//!         t.on_sync(DoorTriggerKind::Push, |ctx, _| {
//!             ctx.transition(Door::Open);
//!             Ok(())
//!         })
//!     })
//!     .state(DoorKind::Open, |t| {
//!         t.on_sync(DoorTriggerKind::Pull, |ctx, _| {
//!             ctx.transition(Door::Closed);
//!             Ok(())
//!         })
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.states(), vec![DoorKind::Closed, DoorKind::Open]);
//! assert_eq!(registry.state_triggers(DoorKind::Open), vec![DoorTriggerKind::Pull]);
//! ```

pub mod builder;
pub mod error;

pub use builder::{RegistryBuilder, StateTriggers};
pub use error::{BuildError, DeclarationError};

use crate::core::{State, Trigger};
use crate::machine::{ActionError, TransitionContext};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A transition function bound to one trigger of one state.
pub type TransitionFn<S, T> = Arc<
    dyn Fn(TransitionContext<S, T>, T) -> BoxFuture<'static, Result<(), ActionError>>
        + Send
        + Sync,
>;

pub(crate) struct StateEntry<S: State, T: Trigger> {
    pub(crate) state: S::Kind,
    pub(crate) triggers: Vec<(T::Kind, TransitionFn<S, T>)>,
}

/// Immutable mapping from state to its triggers and transition functions.
pub struct Registry<S: State, T: Trigger> {
    entries: Vec<StateEntry<S, T>>,
}

impl<S: State, T: Trigger> Registry<S, T> {
    pub fn builder() -> RegistryBuilder<S, T> {
        RegistryBuilder::new()
    }

    /// All states, in declaration order.
    pub fn states(&self) -> Vec<S::Kind> {
        self.entries.iter().map(|entry| entry.state).collect()
    }

    /// All distinct triggers across every state, first-seen order.
    pub fn triggers(&self) -> Vec<T::Kind> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .flat_map(|entry| entry.triggers.iter().map(|(trigger, _)| *trigger))
            .filter(|trigger| seen.insert(*trigger))
            .collect()
    }

    /// Triggers valid in `state`, in declaration order.
    pub fn state_triggers(&self, state: S::Kind) -> Vec<T::Kind> {
        self.entry(state)
            .map(|entry| entry.triggers.iter().map(|(trigger, _)| *trigger).collect())
            .unwrap_or_default()
    }

    /// Look up the transition function for `trigger` in `state`.
    pub fn resolve(&self, state: S::Kind, trigger: T::Kind) -> Option<&TransitionFn<S, T>> {
        self.entry(state)?
            .triggers
            .iter()
            .find(|(bound, _)| *bound == trigger)
            .map(|(_, action)| action)
    }

    fn entry(&self, state: S::Kind) -> Option<&StateEntry<S, T>> {
        self.entries.iter().find(|entry| entry.state == state)
    }
}

impl<S: State, T: Trigger> fmt::Debug for Registry<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.state, self.state_triggers(entry.state))),
            )
            .finish()
    }
}
