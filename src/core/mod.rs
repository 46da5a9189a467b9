//! Core machine types.
//!
//! This module contains the pure building blocks of the machine:
//! - States and triggers as tagged unions via the `State` and `Trigger` traits
//! - The invocation `Guard`
//! - Event records and transition history
//!
//! Nothing in this module touches shared state or runs transition functions.

mod guard;
mod history;
mod macros;
mod state;

pub use guard::{Guard, Invocation, Rejection};
pub use history::{StateHistory, TransitionRecord, TriggerRecord};
pub use state::{Kind, State, Trigger};
