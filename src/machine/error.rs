//! Errors surfaced by trigger invocations.

use std::time::Duration;
use thiserror::Error;

/// Error returned by a transition function.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while invoking a trigger.
///
/// Guard rejections are not errors; see
/// [`Invocation::Rejected`](crate::core::Invocation::Rejected).
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Trigger '{trigger}' is not declared for state '{state}'")]
    InvalidTrigger {
        state: &'static str,
        trigger: &'static str,
    },

    #[error("Trigger '{trigger}' failed in state '{state}': {source}")]
    ActionFailed {
        state: &'static str,
        trigger: &'static str,
        #[source]
        source: ActionError,
    },

    #[error("Trigger '{trigger}' in state '{state}' did not settle within {deadline:?}")]
    DeadlineExceeded {
        state: &'static str,
        trigger: &'static str,
        deadline: Duration,
    },
}
