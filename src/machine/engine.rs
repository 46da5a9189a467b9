//! The machine engine: current state, invocation guard and commits.

use crate::binding::Binding;
use crate::core::{
    Guard, Invocation, Kind, State, StateHistory, TransitionRecord, Trigger, TriggerRecord,
};
use crate::events::{EventBus, Listener, Subscription};
use crate::machine::builder::StateMachineBuilder;
use crate::machine::config::MachineConfig;
use crate::machine::context::TransitionContext;
use crate::machine::error::TriggerError;
use crate::registry::Registry;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Construction hooks, called before bus subscribers.
pub(crate) struct Hooks<S: State, T: Trigger> {
    pub(crate) transition_done: Option<Listener<TransitionRecord<S>>>,
    pub(crate) trigger_invoked: Option<Listener<TriggerRecord<S, T>>>,
}

impl<S: State, T: Trigger> Default for Hooks<S, T> {
    fn default() -> Self {
        Self {
            transition_done: None,
            trigger_invoked: None,
        }
    }
}

struct Current<S: State> {
    state: S,
    blocked: bool,
    history: StateHistory<S>,
}

/// Engine state shared by every handle and every transition context.
pub(crate) struct Shared<S: State, T: Trigger> {
    registry: Registry<S, T>,
    config: MachineConfig,
    current: Mutex<Current<S>>,
    bus: EventBus<S, T>,
    hooks: Hooks<S, T>,
}

impl<S: State, T: Trigger> Shared<S, T> {
    fn lock(&self) -> MutexGuard<'_, Current<S>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn registry(&self) -> &Registry<S, T> {
        &self.registry
    }

    pub(crate) fn commit(&self, next: S) {
        let (record, in_flight) = {
            let mut current = self.lock();
            let previous = std::mem::replace(&mut current.state, next.clone());
            let record = TransitionRecord::new(previous, next);
            if self.config.record_history {
                current.history.record(record.clone());
            }
            (record, current.blocked)
        };

        if !in_flight {
            tracing::warn!(
                machine = %self.config.name,
                from = record.from.name(),
                to = record.to.name(),
                "transition committed outside of a trigger execution"
            );
        }
        tracing::debug!(
            machine = %self.config.name,
            from = record.from.name(),
            to = record.to.name(),
            "transition committed"
        );

        if let Some(hook) = &self.hooks.transition_done {
            hook(&record);
        }
        self.bus.transition_done().publish(&record);
    }

    fn emit_trigger_invoked(&self, record: TriggerRecord<S, T>) {
        if let Some(hook) = &self.hooks.trigger_invoked {
            hook(&record);
        }
        self.bus.trigger_invoked().publish(&record);
    }
}

/// Clears the blocked flag on every exit path of an invocation, including
/// the invocation future being dropped.
struct Release<'a, S: State, T: Trigger> {
    shared: &'a Shared<S, T>,
}

impl<S: State, T: Trigger> Drop for Release<'_, S, T> {
    fn drop(&mut self) {
        self.shared.lock().blocked = false;
    }
}

/// Handle to a running machine.
///
/// Cloning is cheap; all clones drive the same machine. The registry, state
/// and blocked flag are only changed through [`invoke_trigger`] and the
/// [`TransitionContext`] it hands to transition functions.
///
/// [`invoke_trigger`]: Self::invoke_trigger
pub struct StateMachine<S: State, T: Trigger> {
    shared: Arc<Shared<S, T>>,
}

impl<S: State, T: Trigger> StateMachine<S, T> {
    /// Create a machine in `initial` with default configuration.
    pub fn new(initial: S, registry: Registry<S, T>) -> Self {
        Self::from_parts(initial, registry, MachineConfig::default(), Hooks::default())
    }

    pub fn builder() -> StateMachineBuilder<S, T> {
        StateMachineBuilder::new()
    }

    pub(crate) fn from_parts(
        initial: S,
        registry: Registry<S, T>,
        config: MachineConfig,
        hooks: Hooks<S, T>,
    ) -> Self {
        tracing::debug!(machine = %config.name, initial = initial.name(), "machine created");
        Self {
            shared: Arc::new(Shared {
                registry,
                config,
                current: Mutex::new(Current {
                    state: initial,
                    blocked: false,
                    history: StateHistory::new(),
                }),
                bus: EventBus::new(),
                hooks,
            }),
        }
    }

    /// Current state (pure)
    pub fn current_state(&self) -> S::Kind {
        self.shared.lock().state.kind()
    }

    /// Current state value with its payload (pure)
    pub fn current_payload(&self) -> S {
        self.shared.lock().state.clone()
    }

    /// Whether a trigger is executing (pure)
    pub fn is_blocked(&self) -> bool {
        self.shared.lock().blocked
    }

    /// Check if machine is in a final state (pure)
    pub fn is_final(&self) -> bool {
        self.shared.lock().state.is_final()
    }

    /// Invoke `trigger`, provided the machine is in `claimed` and idle.
    ///
    /// When the guard fails nothing runs, nothing is emitted and the call
    /// returns `Ok(Invocation::Rejected(..))`. Otherwise the machine blocks,
    /// emits a trigger-invoked event, runs the transition function to
    /// completion and unblocks, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::InvalidTrigger`] if `trigger` is not declared for
    ///   `claimed`; checked before blocking or emitting anything.
    /// - [`TriggerError::ActionFailed`] if the transition function failed.
    /// - [`TriggerError::DeadlineExceeded`] if a configured deadline elapsed.
    pub async fn invoke_trigger(
        &self,
        claimed: S::Kind,
        trigger: T,
    ) -> Result<Invocation<S::Kind>, TriggerError> {
        let shared = &*self.shared;
        let state_name = claimed.as_str();
        let trigger_name = trigger.name();

        let (snapshot, was_blocked, action) = {
            let mut current = shared.lock();
            if let Err(rejection) = Guard::check(claimed, current.state.kind(), current.blocked) {
                tracing::debug!(
                    machine = %shared.config.name,
                    trigger = trigger_name,
                    %rejection,
                    "trigger dropped by guard"
                );
                return Ok(Invocation::Rejected(rejection));
            }

            let action = shared
                .registry
                .resolve(claimed, trigger.kind())
                .cloned()
                .ok_or(TriggerError::InvalidTrigger {
                    state: state_name,
                    trigger: trigger_name,
                })?;

            let was_blocked = current.blocked;
            current.blocked = true;
            (current.state.clone(), was_blocked, action)
        };
        let _release = Release { shared };

        tracing::debug!(
            machine = %shared.config.name,
            state = state_name,
            trigger = trigger_name,
            "trigger accepted"
        );
        shared.emit_trigger_invoked(TriggerRecord::new(snapshot.clone(), trigger.clone()));

        let context = TransitionContext::new(Arc::clone(&self.shared), snapshot, was_blocked);
        let pending = action(context, trigger);
        let settled = match shared.config.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, pending).await {
                Ok(settled) => settled,
                Err(_) => {
                    tracing::warn!(
                        machine = %shared.config.name,
                        state = state_name,
                        trigger = trigger_name,
                        ?deadline,
                        "trigger deadline exceeded"
                    );
                    return Err(TriggerError::DeadlineExceeded {
                        state: state_name,
                        trigger: trigger_name,
                        deadline,
                    });
                }
            },
            None => pending.await,
        };

        settled.map_err(|source| {
            tracing::warn!(
                machine = %shared.config.name,
                state = state_name,
                trigger = trigger_name,
                error = %source,
                "transition function failed"
            );
            TriggerError::ActionFailed {
                state: state_name,
                trigger: trigger_name,
                source,
            }
        })?;

        Ok(Invocation::Accepted)
    }

    /// All declared states, in declaration order.
    pub fn all_states(&self) -> Vec<S::Kind> {
        self.shared.registry.states()
    }

    /// All distinct triggers, first-seen order across states.
    pub fn all_triggers(&self) -> Vec<T::Kind> {
        self.shared.registry.triggers()
    }

    /// Triggers valid in `state`, in declaration order.
    pub fn state_triggers(&self, state: S::Kind) -> Vec<T::Kind> {
        self.shared.registry.state_triggers(state)
    }

    /// Subscribe to committed transitions.
    pub fn on_transition_done<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TransitionRecord<S>) + Send + Sync + 'static,
    {
        self.shared.bus.transition_done().subscribe(listener)
    }

    /// Subscribe to accepted trigger invocations.
    pub fn on_trigger_invoked<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TriggerRecord<S, T>) + Send + Sync + 'static,
    {
        self.shared.bus.trigger_invoked().subscribe(listener)
    }

    /// Snapshot of committed transitions.
    pub fn history(&self) -> StateHistory<S> {
        self.shared.lock().history.clone()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.shared.config
    }

    /// Capture the current state for a consumer.
    pub fn observe(&self) -> Binding<S, T> {
        Binding::new(self.clone())
    }
}

impl<S: State, T: Trigger> Clone for StateMachine<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State, T: Trigger> fmt::Debug for StateMachine<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.shared.lock();
        f.debug_struct("StateMachine")
            .field("name", &self.shared.config.name)
            .field("state", &current.state)
            .field("blocked", &current.blocked)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rejection;
    use crate::machine::ActionError;
    use std::time::Duration;
    use tokio::sync::Notify;

    crate::machine_states! {
        enum Login => LoginKind {
            Credentials,
            VerifySuccess { user_id: String, user_name: String },
            VerifyFail,
        }
        final: [VerifySuccess]
    }

    crate::machine_triggers! {
        enum LoginTrigger => LoginTriggerKind {
            Verify { email: String, password: String },
            VerifyPending,
            Explode,
            Flip,
            Retry,
        }
    }

    type Transitions = Arc<Mutex<Vec<TransitionRecord<Login>>>>;
    type Invocations = Arc<Mutex<Vec<TriggerRecord<Login, LoginTrigger>>>>;

    fn admin() -> Login {
        Login::VerifySuccess {
            user_id: "u1".to_string(),
            user_name: "ADMIN".to_string(),
        }
    }

    fn verify() -> LoginTrigger {
        LoginTrigger::Verify {
            email: "user@mail.com".to_string(),
            password: "pass1234".to_string(),
        }
    }

    fn registry(release: Arc<Notify>) -> Registry<Login, LoginTrigger> {
        Registry::<Login, LoginTrigger>::builder()
            .state(LoginKind::Credentials, move |t| {
                t.on_sync(LoginTriggerKind::Verify, |ctx, _| {
                    ctx.transition(admin());
                    Ok(())
                })
                .on(LoginTriggerKind::VerifyPending, move |ctx, _| {
                    let release = Arc::clone(&release);
                    async move {
                        release.notified().await;
                        ctx.transition(admin());
                        Ok(())
                    }
                })
                .on_sync(LoginTriggerKind::Explode, |_, _| {
                    Err(ActionError::from("backend unavailable"))
                })
                .on_sync(LoginTriggerKind::Flip, |ctx, _| {
                    ctx.transition(Login::VerifyFail);
                    ctx.transition(admin());
                    Ok(())
                })
            })
            .terminal(LoginKind::VerifySuccess)
            .state(LoginKind::VerifyFail, |t| {
                t.on_sync(LoginTriggerKind::Retry, |ctx, _| {
                    ctx.transition(Login::Credentials);
                    Ok(())
                })
            })
            .build()
            .unwrap()
    }

    fn machine() -> StateMachine<Login, LoginTrigger> {
        StateMachine::new(Login::Credentials, registry(Arc::new(Notify::new())))
    }

    fn record(
        machine: &StateMachine<Login, LoginTrigger>,
    ) -> (Transitions, Invocations, Subscription, Subscription) {
        let transitions: Transitions = Arc::default();
        let invocations: Invocations = Arc::default();

        let sink = Arc::clone(&transitions);
        let done = machine.on_transition_done(move |record| sink.lock().unwrap().push(record.clone()));
        let sink = Arc::clone(&invocations);
        let invoked = machine.on_trigger_invoked(move |record| sink.lock().unwrap().push(record.clone()));

        (transitions, invocations, done, invoked)
    }

    #[test]
    fn new_machine_reports_initial_state() {
        let machine = machine();

        assert_eq!(machine.current_state(), LoginKind::Credentials);
        assert_eq!(machine.current_payload(), Login::Credentials);
        assert!(!machine.is_blocked());
        assert!(!machine.is_final());
        assert!(machine.history().is_empty());
    }

    #[tokio::test]
    async fn sync_trigger_commits_and_emits_once() {
        let machine = machine();
        let (transitions, invocations, _done, _invoked) = record(&machine);

        let outcome = machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();

        assert_eq!(outcome, Invocation::Accepted);
        assert_eq!(machine.current_state(), LoginKind::VerifySuccess);
        assert_eq!(machine.current_payload(), admin());
        assert!(!machine.is_blocked());
        assert!(machine.is_final());

        let invocations = invocations.lock().unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].state, Login::Credentials);
        assert_eq!(invocations[0].trigger, verify());

        let transitions = transitions.lock().unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, Login::Credentials);
        assert_eq!(transitions[0].to, admin());
    }

    #[tokio::test]
    async fn stale_claim_is_dropped_without_events() {
        let machine = machine();
        let (transitions, invocations, _done, _invoked) = record(&machine);

        let outcome = machine
            .invoke_trigger(LoginKind::VerifyFail, LoginTrigger::Retry)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Invocation::Rejected(Rejection::StaleState {
                claimed: LoginKind::VerifyFail,
                current: LoginKind::Credentials,
            })
        );
        assert_eq!(machine.current_state(), LoginKind::Credentials);
        assert!(transitions.lock().unwrap().is_empty());
        assert!(invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_trigger_blocks_until_settled() {
        let release = Arc::new(Notify::new());
        let machine = StateMachine::new(Login::Credentials, registry(Arc::clone(&release)));
        let (transitions, _, _done, _invoked) = record(&machine);

        let mut invocation = std::pin::pin!(
            machine.invoke_trigger(LoginKind::Credentials, LoginTrigger::VerifyPending)
        );
        assert!(futures::poll!(invocation.as_mut()).is_pending());
        assert!(machine.is_blocked());
        assert!(transitions.lock().unwrap().is_empty());

        release.notify_one();
        let outcome = invocation.await.unwrap();

        assert!(outcome.is_accepted());
        assert!(!machine.is_blocked());
        assert_eq!(machine.current_payload(), admin());
        assert_eq!(transitions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invocation_while_blocked_is_rejected() {
        let release = Arc::new(Notify::new());
        let machine = StateMachine::new(Login::Credentials, registry(Arc::clone(&release)));

        let mut pending = std::pin::pin!(
            machine.invoke_trigger(LoginKind::Credentials, LoginTrigger::VerifyPending)
        );
        assert!(futures::poll!(pending.as_mut()).is_pending());

        let (_, invocations, _done, _invoked) = record(&machine);
        let outcome = machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Invocation::Rejected(Rejection::Blocked {
                current: LoginKind::Credentials
            })
        );
        assert!(invocations.lock().unwrap().is_empty());

        release.notify_one();
        assert!(pending.await.unwrap().is_accepted());
    }

    #[tokio::test]
    async fn undeclared_trigger_fails_fast() {
        let machine = machine();
        let (transitions, invocations, _done, _invoked) = record(&machine);

        let result = machine
            .invoke_trigger(LoginKind::Credentials, LoginTrigger::Retry)
            .await;

        assert!(matches!(
            result,
            Err(TriggerError::InvalidTrigger {
                state: "Credentials",
                trigger: "Retry"
            })
        ));
        assert!(!machine.is_blocked());
        assert!(transitions.lock().unwrap().is_empty());
        assert!(invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_action_unblocks_machine() {
        let machine = machine();

        let result = machine
            .invoke_trigger(LoginKind::Credentials, LoginTrigger::Explode)
            .await;

        match result {
            Err(TriggerError::ActionFailed { trigger, source, .. }) => {
                assert_eq!(trigger, "Explode");
                assert_eq!(source.to_string(), "backend unavailable");
            }
            other => panic!("Expected ActionFailed, got {other:?}"),
        }
        assert!(!machine.is_blocked());
        assert_eq!(machine.current_state(), LoginKind::Credentials);

        let outcome = machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();
        assert!(outcome.is_accepted());
    }

    #[tokio::test]
    async fn last_transition_wins_and_each_emits() {
        let machine = machine();
        let (transitions, _, _done, _invoked) = record(&machine);

        machine
            .invoke_trigger(LoginKind::Credentials, LoginTrigger::Flip)
            .await
            .unwrap();

        assert_eq!(machine.current_payload(), admin());
        let transitions = transitions.lock().unwrap();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].to_state(), LoginKind::VerifyFail);
        assert_eq!(transitions[1].from_state(), LoginKind::VerifyFail);
        assert_eq!(transitions[1].to_state(), LoginKind::VerifySuccess);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_unblocks_hung_trigger() {
        let machine = StateMachine::builder()
            .initial(Login::Credentials)
            .registry(registry(Arc::new(Notify::new())))
            .deadline(Duration::from_secs(3))
            .build()
            .unwrap();

        let result = machine
            .invoke_trigger(LoginKind::Credentials, LoginTrigger::VerifyPending)
            .await;

        assert!(matches!(
            result,
            Err(TriggerError::DeadlineExceeded { deadline, .. }) if deadline == Duration::from_secs(3)
        ));
        assert!(!machine.is_blocked());
        assert_eq!(machine.current_state(), LoginKind::Credentials);
    }

    #[tokio::test]
    async fn dropping_invocation_unblocks_machine() {
        let machine = machine();

        {
            let mut invocation = std::pin::pin!(
                machine.invoke_trigger(LoginKind::Credentials, LoginTrigger::VerifyPending)
            );
            assert!(futures::poll!(invocation.as_mut()).is_pending());
            assert!(machine.is_blocked());
        }

        assert!(!machine.is_blocked());
    }

    #[tokio::test]
    async fn hooks_run_before_subscribers() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&order);
        let hook_invoked = move |_: &TriggerRecord<Login, LoginTrigger>| {
            sink.lock().unwrap().push("hook:invoked")
        };
        let sink = Arc::clone(&order);
        let hook_done = move |_: &TransitionRecord<Login>| sink.lock().unwrap().push("hook:done");

        let machine = StateMachine::builder()
            .initial(Login::Credentials)
            .registry(registry(Arc::new(Notify::new())))
            .on_trigger_invoked(hook_invoked)
            .on_transition_done(hook_done)
            .build()
            .unwrap();

        let sink = Arc::clone(&order);
        let _invoked = machine.on_trigger_invoked(move |_| sink.lock().unwrap().push("bus:invoked"));
        let sink = Arc::clone(&order);
        let _done = machine.on_transition_done(move |_| sink.lock().unwrap().push("bus:done"));

        machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            vec!["hook:invoked", "bus:invoked", "hook:done", "bus:done"]
        );
    }

    #[tokio::test]
    async fn listeners_observe_blocked_machine() {
        let machine = machine();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observer = machine.clone();
        let sink = Arc::clone(&seen);
        let _invoked = machine.on_trigger_invoked(move |_| {
            sink.lock()
                .unwrap()
                .push((observer.current_state(), observer.is_blocked()));
        });
        let observer = machine.clone();
        let sink = Arc::clone(&seen);
        let _done = machine.on_transition_done(move |_| {
            sink.lock()
                .unwrap()
                .push((observer.current_state(), observer.is_blocked()));
        });

        machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (LoginKind::Credentials, true),
                (LoginKind::VerifySuccess, true)
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_subscription_gets_nothing() {
        let machine = machine();
        let (transitions, invocations, done, invoked) = record(&machine);
        let (others, _, _other_done, _other_invoked) = record(&machine);

        done.cancel();
        invoked.cancel();
        machine
            .invoke_trigger(LoginKind::Credentials, verify())
            .await
            .unwrap();

        assert!(transitions.lock().unwrap().is_empty());
        assert!(invocations.lock().unwrap().is_empty());
        assert_eq!(others.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn context_exposes_pre_call_snapshot() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let registry = Registry::<Login, LoginTrigger>::builder()
            .state(LoginKind::VerifyFail, move |t| {
                t.on_sync(LoginTriggerKind::Retry, move |ctx, _| {
                    ctx.transition(Login::Credentials);
                    *sink.lock().unwrap() = Some((
                        ctx.state(),
                        ctx.payload().clone(),
                        ctx.is_blocked(),
                        ctx.all_states(),
                    ));
                    Ok(())
                })
            })
            .terminal(LoginKind::Credentials)
            .terminal(LoginKind::VerifySuccess)
            .build()
            .unwrap();
        let machine = StateMachine::new(Login::VerifyFail, registry);

        machine
            .invoke_trigger(LoginKind::VerifyFail, LoginTrigger::Retry)
            .await
            .unwrap();

        let (state, payload, blocked, states) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(state, LoginKind::VerifyFail);
        assert_eq!(payload, Login::VerifyFail);
        assert!(!blocked);
        assert_eq!(
            states,
            vec![
                LoginKind::VerifyFail,
                LoginKind::Credentials,
                LoginKind::VerifySuccess
            ]
        );
        assert_eq!(machine.current_state(), LoginKind::Credentials);
    }

    #[test]
    fn enumeration_delegates_to_registry() {
        let machine = machine();

        assert_eq!(
            machine.all_states(),
            vec![
                LoginKind::Credentials,
                LoginKind::VerifySuccess,
                LoginKind::VerifyFail
            ]
        );
        assert_eq!(
            machine.all_triggers(),
            vec![
                LoginTriggerKind::Verify,
                LoginTriggerKind::VerifyPending,
                LoginTriggerKind::Explode,
                LoginTriggerKind::Flip,
                LoginTriggerKind::Retry,
            ]
        );
        assert_eq!(
            machine.state_triggers(LoginKind::VerifyFail),
            vec![LoginTriggerKind::Retry]
        );
        assert!(machine.state_triggers(LoginKind::VerifySuccess).is_empty());
    }
}
