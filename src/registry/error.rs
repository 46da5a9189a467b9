//! Errors raised while declaring registries and building machines.

use thiserror::Error;

/// A single problem found in a registry declaration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("State '{state}' is declared more than once")]
    DuplicateState { state: &'static str },

    #[error("Trigger '{trigger}' is declared more than once in state '{state}'")]
    DuplicateTrigger {
        state: &'static str,
        trigger: &'static str,
    },

    #[error("State '{state}' is never declared. Declare it with .state() or .terminal()")]
    UndeclaredState { state: &'static str },
}

/// Errors that can occur when building registries and machines.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Registry not specified. Call .registry(registry) before .build()")]
    MissingRegistry,

    #[error("Registry declaration is invalid ({} violation(s)): {}", .0.len(), join(.0))]
    InvalidRegistry(Vec<DeclarationError>),
}

fn join(violations: &[DeclarationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
