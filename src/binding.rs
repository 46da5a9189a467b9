//! Consumer binding: what rendering code holds on to.
//!
//! A [`Binding`] remembers the state its consumer last observed. Triggers are
//! always invoked against that observed state, so a consumer acting on an
//! outdated view is absorbed by the machine's guard instead of firing a
//! trigger in a state it never saw.

use crate::core::{Invocation, State, TransitionRecord, Trigger, TriggerRecord};
use crate::events::Subscription;
use crate::machine::{StateMachine, TriggerError};
use std::fmt;

/// Snapshot of a machine as seen by one consumer, plus the machine handle.
pub struct Binding<S: State, T: Trigger> {
    machine: StateMachine<S, T>,
    observed: S,
    blocked: bool,
}

impl<S: State, T: Trigger> Binding<S, T> {
    pub(crate) fn new(machine: StateMachine<S, T>) -> Self {
        let observed = machine.current_payload();
        let blocked = machine.is_blocked();
        Self {
            machine,
            observed,
            blocked,
        }
    }

    /// Observed state.
    pub fn state(&self) -> S::Kind {
        self.observed.kind()
    }

    /// Observed state value with its payload.
    pub fn payload(&self) -> &S {
        &self.observed
    }

    /// Observed blocked flag.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Whether the machine has moved on since this binding observed it.
    pub fn is_stale(&self) -> bool {
        self.machine.current_payload() != self.observed || self.machine.is_blocked() != self.blocked
    }

    /// Observe the machine again.
    pub fn refresh(&mut self) {
        self.observed = self.machine.current_payload();
        self.blocked = self.machine.is_blocked();
    }

    /// Invoke `trigger` claiming the observed state.
    pub async fn invoke(&self, trigger: T) -> Result<Invocation<S::Kind>, TriggerError> {
        self.machine.invoke_trigger(self.observed.kind(), trigger).await
    }

    /// Run `render` only if the observed state is `step`.
    ///
    /// ```rust
    /// use stepwise::machine::StateMachine;
    /// use stepwise::registry::Registry;
    /// use stepwise::{machine_states, machine_triggers};
    ///
    /// machine_states! {
    ///     enum Step => StepKind { Form { draft: String }, Sent }
    /// }
    /// machine_triggers! {
    ///     enum StepTrigger => StepTriggerKind { Send }
    /// }
    ///
    /// let registry = Registry::<Step, StepTrigger>::builder()
    ///     .state(StepKind::Form, |t| t.on_sync(StepTriggerKind::Send, |_, _| Ok(())))
    ///     .terminal(StepKind::Sent)
    ///     .build()
    ///     .unwrap();
    /// let machine = StateMachine::new(Step::Form { draft: "hi".into() }, registry);
    /// let view = machine.observe();
    ///
    /// let form = view.render(StepKind::Form, |step, _| match step {
    ///     Step::Form { draft } => format!("<textarea>{draft}</textarea>"),
    ///     _ => unreachable!(),
    /// });
    /// assert_eq!(form.as_deref(), Some("<textarea>hi</textarea>"));
    /// assert!(view.render(StepKind::Sent, |_, _| "sent").is_none());
    /// ```
    pub fn render<R, F>(&self, step: S::Kind, render: F) -> Option<R>
    where
        F: FnOnce(&S, &Self) -> R,
    {
        (self.observed.kind() == step).then(|| render(&self.observed, self))
    }

    /// All declared states, in declaration order.
    pub fn all_states(&self) -> Vec<S::Kind> {
        self.machine.all_states()
    }

    /// All distinct triggers, first-seen order across states.
    pub fn all_triggers(&self) -> Vec<T::Kind> {
        self.machine.all_triggers()
    }

    /// Triggers valid in `state`.
    pub fn state_triggers(&self, state: S::Kind) -> Vec<T::Kind> {
        self.machine.state_triggers(state)
    }

    /// Triggers valid in the observed state.
    pub fn available_triggers(&self) -> Vec<T::Kind> {
        self.machine.state_triggers(self.observed.kind())
    }

    pub fn on_transition_done<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TransitionRecord<S>) + Send + Sync + 'static,
    {
        self.machine.on_transition_done(listener)
    }

    pub fn on_trigger_invoked<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TriggerRecord<S, T>) + Send + Sync + 'static,
    {
        self.machine.on_trigger_invoked(listener)
    }

    /// The machine behind this binding.
    pub fn machine(&self) -> &StateMachine<S, T> {
        &self.machine
    }
}

impl<S: State, T: Trigger> Clone for Binding<S, T> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            observed: self.observed.clone(),
            blocked: self.blocked,
        }
    }
}

impl<S: State, T: Trigger> fmt::Debug for Binding<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("observed", &self.observed)
            .field("blocked", &self.blocked)
            .finish_non_exhaustive()
    }
}
