//! Event notification bus.
//!
//! Every machine owns one [`EventBus`] with two independent channels:
//! `transition_done` (one [`TransitionRecord`] per committed transition) and
//! `trigger_invoked` (one [`TriggerRecord`] per accepted invocation).

mod channel;

pub use channel::{Channel, Listener, Subscription};

use crate::core::{State, Trigger, TransitionRecord, TriggerRecord};

/// The two channels of a machine.
#[derive(Debug)]
pub struct EventBus<S: State, T: Trigger> {
    transition_done: Channel<TransitionRecord<S>>,
    trigger_invoked: Channel<TriggerRecord<S, T>>,
}

impl<S: State, T: Trigger> EventBus<S, T> {
    pub fn new() -> Self {
        Self {
            transition_done: Channel::new(),
            trigger_invoked: Channel::new(),
        }
    }

    pub fn transition_done(&self) -> &Channel<TransitionRecord<S>> {
        &self.transition_done
    }

    pub fn trigger_invoked(&self) -> &Channel<TriggerRecord<S, T>> {
        &self.trigger_invoked
    }
}

impl<S: State, T: Trigger> Default for EventBus<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
