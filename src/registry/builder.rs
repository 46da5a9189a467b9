//! Fluent declaration of registries.

use crate::core::{Kind, State, Trigger};
use crate::machine::{ActionError, TransitionContext};
use crate::registry::error::{BuildError, DeclarationError};
use crate::registry::{Registry, StateEntry, TransitionFn};
use futures::future::{self, FutureExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Triggers declared for one state.
pub struct StateTriggers<S: State, T: Trigger> {
    triggers: Vec<(T::Kind, TransitionFn<S, T>)>,
}

impl<S: State, T: Trigger> StateTriggers<S, T> {
    fn new() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }

    /// Bind an asynchronous transition function to a trigger.
    ///
    /// The function receives the context and the trigger value (its
    /// arguments). The engine stays blocked until the returned future settles.
    pub fn on<F, Fut>(mut self, trigger: T::Kind, action: F) -> Self
    where
        F: Fn(TransitionContext<S, T>, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        let action: TransitionFn<S, T> = Arc::new(move |ctx, trigger| action(ctx, trigger).boxed());
        self.triggers.push((trigger, action));
        self
    }

    /// Bind a synchronous transition function to a trigger.
    pub fn on_sync<F>(mut self, trigger: T::Kind, action: F) -> Self
    where
        F: Fn(&TransitionContext<S, T>, T) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        let action: TransitionFn<S, T> =
            Arc::new(move |ctx, trigger| future::ready(action(&ctx, trigger)).boxed());
        self.triggers.push((trigger, action));
        self
    }
}

/// Builder for [`Registry`].
///
/// Every state kind must be declared exactly once, terminal states through
/// [`terminal`](Self::terminal). Declaration order is kept for enumeration.
pub struct RegistryBuilder<S: State, T: Trigger> {
    entries: Vec<StateEntry<S, T>>,
}

impl<S: State, T: Trigger> RegistryBuilder<S, T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare a state and the triggers valid in it.
    pub fn state<F>(mut self, state: S::Kind, declare: F) -> Self
    where
        F: FnOnce(StateTriggers<S, T>) -> StateTriggers<S, T>,
    {
        let triggers = declare(StateTriggers::new()).triggers;
        self.entries.push(StateEntry { state, triggers });
        self
    }

    /// Declare a state without triggers.
    pub fn terminal(self, state: S::Kind) -> Self {
        self.state(state, |triggers| triggers)
    }

    /// Build the registry, reporting every declaration violation at once.
    pub fn build(self) -> Result<Registry<S, T>, BuildError> {
        match validate(&self.entries) {
            Validation::Success(()) => Ok(Registry {
                entries: self.entries,
            }),
            Validation::Failure(violations) => Err(BuildError::InvalidRegistry(
                violations.iter().cloned().collect(),
            )),
        }
    }
}

impl<S: State, T: Trigger> Default for RegistryBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

fn validate<S: State, T: Trigger>(
    entries: &[StateEntry<S, T>],
) -> Validation<(), NonEmptyVec<DeclarationError>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<DeclarationError>>> = Vec::new();
    let mut declared = HashSet::new();

    for entry in entries {
        checks.push(if declared.insert(entry.state) {
            Validation::success(())
        } else {
            Validation::fail(DeclarationError::DuplicateState {
                state: entry.state.as_str(),
            })
        });

        let mut bound = HashSet::new();
        for (trigger, _) in &entry.triggers {
            checks.push(if bound.insert(*trigger) {
                Validation::success(())
            } else {
                Validation::fail(DeclarationError::DuplicateTrigger {
                    state: entry.state.as_str(),
                    trigger: trigger.as_str(),
                })
            });
        }
    }

    for state in <S::Kind as Kind>::ALL {
        checks.push(if declared.contains(state) {
            Validation::success(())
        } else {
            Validation::fail(DeclarationError::UndeclaredState {
                state: state.as_str(),
            })
        });
    }

    Validation::all_vec(checks).map(|_| ())
}
