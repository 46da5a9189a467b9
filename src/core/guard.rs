//! The invocation guard.
//!
//! A trigger is only accepted when the caller's claimed state is the machine's
//! actual state and no other trigger is executing. Rejections are not errors:
//! they absorb races from consumers that acted on a state the machine has
//! already left.

use super::state::Kind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an invocation was dropped by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection<K: Kind> {
    /// The caller claimed a state the machine is no longer (or not yet) in
    StaleState { claimed: K, current: K },

    /// Another trigger is still executing
    Blocked { current: K },
}

impl<K: Kind> fmt::Display for Rejection<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleState { claimed, current } => write!(
                f,
                "claimed state '{}' but machine is in '{}'",
                claimed.as_str(),
                current.as_str()
            ),
            Self::Blocked { current } => {
                write!(f, "machine is blocked in '{}'", current.as_str())
            }
        }
    }
}

/// Outcome of a guarded trigger invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invocation<K: Kind> {
    /// The guard passed and the transition function ran to completion
    Accepted,

    /// The guard dropped the call; nothing ran and nothing was emitted
    Rejected(Rejection<K>),
}

impl<K: Kind> Invocation<K> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn rejection(&self) -> Option<&Rejection<K>> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Pure check deciding whether an invocation may run.
///
/// A stale claim is reported before a blocked machine.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{Guard, Rejection};
/// use stepwise::machine_states;
///
/// machine_states! {
///     enum Step => StepKind { Form, Review }
/// }
///
/// assert!(Guard::check(StepKind::Form, StepKind::Form, false).is_ok());
/// assert_eq!(
///     Guard::check(StepKind::Form, StepKind::Review, false),
///     Err(Rejection::StaleState {
///         claimed: StepKind::Form,
///         current: StepKind::Review,
///     })
/// );
/// assert_eq!(
///     Guard::check(StepKind::Review, StepKind::Review, true),
///     Err(Rejection::Blocked { current: StepKind::Review })
/// );
/// ```
pub struct Guard;

impl Guard {
    pub fn check<K: Kind>(claimed: K, current: K, blocked: bool) -> Result<(), Rejection<K>> {
        if claimed != current {
            return Err(Rejection::StaleState { claimed, current });
        }
        if blocked {
            return Err(Rejection::Blocked { current });
        }
        Ok(())
    }
}
