//! Traits for machine states and triggers.
//!
//! States and triggers are tagged unions: every variant carries its own data
//! (a state's payload, a trigger's arguments) and maps to a fieldless [`Kind`]
//! that names it. Registries and guards work on kinds, transition functions
//! work on the full values.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Fieldless name of a state or trigger variant.
///
/// `ALL` lists every variant of the enum in declaration order. It is used to
/// check that a registry declares every state.
pub trait Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every kind of this enum.
    const ALL: &'static [Self];

    /// Name used in events, logs and error messages.
    fn as_str(&self) -> &'static str;
}

/// Trait for machine states.
///
/// A state value is the state name *and* its payload. Since the payload lives
/// inside the variant, a state can never be paired with another state's
/// payload.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{Kind, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum StepKind {
///     Editing,
///     Saved,
/// }
///
/// impl Kind for StepKind {
///     const ALL: &'static [Self] = &[Self::Editing, Self::Saved];
///
///     fn as_str(&self) -> &'static str {
///         match self {
///             Self::Editing => "Editing",
///             Self::Saved => "Saved",
///         }
///     }
/// }
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Step {
///     Editing,
///     Saved { revision: u32 },
/// }
///
/// impl State for Step {
///     type Kind = StepKind;
///
///     fn kind(&self) -> StepKind {
///         match self {
///             Self::Editing => StepKind::Editing,
///             Self::Saved { .. } => StepKind::Saved,
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Saved { .. })
///     }
/// }
///
/// let saved = Step::Saved { revision: 3 };
/// assert_eq!(saved.name(), "Saved");
/// assert!(saved.is_final());
/// ```
///
/// Most code generates both enums with [`machine_states!`](crate::machine_states).
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// The fieldless enum naming each state.
    type Kind: Kind;

    /// Which state this value is, without its payload.
    fn kind(&self) -> Self::Kind;

    /// The state's name for display/logging.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Trait for machine triggers.
///
/// A trigger value is the trigger name and the arguments it was invoked with.
pub trait Trigger:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// The fieldless enum naming each trigger.
    type Kind: Kind;

    /// Which trigger this value is, without its arguments.
    fn kind(&self) -> Self::Kind;

    /// The trigger's name for display/logging.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}
