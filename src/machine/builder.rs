//! Builder for constructing machines.

use crate::core::{State, TransitionRecord, Trigger, TriggerRecord};
use crate::machine::config::MachineConfig;
use crate::machine::engine::{Hooks, StateMachine};
use crate::registry::{BuildError, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing machines with a fluent API.
pub struct StateMachineBuilder<S: State, T: Trigger> {
    initial: Option<S>,
    registry: Option<Registry<S, T>>,
    config: MachineConfig,
    hooks: Hooks<S, T>,
}

impl<S: State, T: Trigger> StateMachineBuilder<S, T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            registry: None,
            config: MachineConfig::default(),
            hooks: Hooks::default(),
        }
    }

    /// Set the initial state and its payload (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the declaration registry (required).
    pub fn registry(mut self, registry: Registry<S, T>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Fail trigger executions that take longer than `deadline`.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn record_history(mut self, record: bool) -> Self {
        self.config.record_history = record;
        self
    }

    /// Hook called on every committed transition, before bus subscribers.
    pub fn on_transition_done<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransitionRecord<S>) + Send + Sync + 'static,
    {
        self.hooks.transition_done = Some(Arc::new(hook));
        self
    }

    /// Hook called on every accepted invocation, before bus subscribers.
    pub fn on_trigger_invoked<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TriggerRecord<S, T>) + Send + Sync + 'static,
    {
        self.hooks.trigger_invoked = Some(Arc::new(hook));
        self
    }

    /// Build the machine.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<StateMachine<S, T>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let registry = self.registry.ok_or(BuildError::MissingRegistry)?;

        Ok(StateMachine::from_parts(
            initial,
            registry,
            self.config,
            self.hooks,
        ))
    }
}

impl<S: State, T: Trigger> Default for StateMachineBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
