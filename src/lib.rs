//! Stepwise: a strongly-typed finite state machine runtime for multi-step flows
//!
//! Stepwise separates *what transitions are legal and what they do* from *how
//! each step is rendered*. A machine is declared once as a registry of states
//! and triggers; consumers read the current state, render it, and invoke
//! triggers against the state they observed.
//!
//! # Core Concepts
//!
//! - **State**: a tagged union whose variants carry their own payload
//! - **Trigger**: a tagged union whose variants carry their own arguments
//! - **Registry**: which triggers are valid in which state, and their
//!   transition functions
//! - **Guard**: a trigger only runs when the claimed state is current and no
//!   other trigger is executing; stale calls are dropped, not failed
//! - **Events**: transition-done and trigger-invoked channels
//!
//! # Example
//!
//! ```rust
//! use stepwise::core::Invocation;
//! use stepwise::machine::StateMachine;
//! use stepwise::registry::Registry;
//! use stepwise::{machine_states, machine_triggers};
//!
//! machine_states! {
//!     pub enum Login => LoginKind {
//!         Credentials,
//!         VerifySuccess { user_id: String, user_name: String },
//!         VerifyFail,
//!     }
//!     final: [VerifySuccess]
//! }
//!
//! machine_triggers! {
//!     pub enum LoginTrigger => LoginTriggerKind {
//!         Verify { email: String, password: String },
//!         Retry,
//!     }
//! }
//!
//! let registry = Registry::<Login, LoginTrigger>::builder()
//!     .state(LoginKind::Credentials, |t| {
//!         t.on_sync(LoginTriggerKind::Verify, |ctx, _| {
//!             ctx.transition(Login::VerifySuccess {
//!                 user_id: "u1".to_string(),
//!                 user_name: "ADMIN".to_string(),
//!             });
//!             Ok(())
//!         })
//!     })
//!     .terminal(LoginKind::VerifySuccess)
//!     .state(LoginKind::VerifyFail, |t| {
//!         t.on_sync(LoginTriggerKind::Retry, |ctx, _| {
//!             ctx.transition(Login::Credentials);
//!             Ok(())
//!         })
//!     })
//!     .build()
//!     .unwrap();
//!
//! let machine = StateMachine::new(Login::Credentials, registry);
//!
//! # futures::executor::block_on(async {
//! let outcome = machine
//!     .invoke_trigger(
//!         LoginKind::Credentials,
//!         LoginTrigger::Verify {
//!             email: "user@mail.com".to_string(),
//!             password: "pass1234".to_string(),
//!         },
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(outcome, Invocation::Accepted);
//! assert_eq!(machine.current_state(), LoginKind::VerifySuccess);
//! # });
//! ```

pub mod binding;
pub mod core;
pub mod events;
pub mod machine;
pub mod registry;

// Re-export commonly used types
pub use binding::Binding;
pub use core::{Guard, Invocation, Kind, Rejection, State, StateHistory, Trigger};
pub use machine::{ActionError, MachineConfig, StateMachine, StateMachineBuilder, TriggerError};
pub use registry::{BuildError, Registry, RegistryBuilder};
