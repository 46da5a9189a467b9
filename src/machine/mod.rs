//! The machine engine.
//!
//! [`StateMachine`] owns the current state, its payload and the blocked flag.
//! Consumers invoke triggers through the guarded, asynchronous
//! [`StateMachine::invoke_trigger`]; transition functions commit new states
//! through the [`TransitionContext`] they receive.
//!
//! Synchronous and asynchronous transition functions share one contract:
//! every function returns a future and the engine awaits it before it accepts
//! the next trigger.

mod builder;
mod config;
mod context;
mod engine;
mod error;

pub use builder::StateMachineBuilder;
pub use config::MachineConfig;
pub use context::TransitionContext;
pub use engine::StateMachine;
pub use error::{ActionError, TriggerError};
