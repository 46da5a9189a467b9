//! Macros generating state and trigger enums.

/// Generate a state enum, its [`Kind`](crate::core::Kind) enum and the
/// [`State`](crate::core::State) implementation.
///
/// Variants are either unit variants (no payload) or struct variants whose
/// fields are the state's payload.
///
/// # Example
///
/// ```
/// use stepwise::core::{Kind, State};
/// use stepwise::machine_states;
///
/// machine_states! {
///     pub enum Login => LoginKind {
///         Credentials,
///         VerifySuccess { user_id: String, user_name: String },
///         VerifyFail,
///     }
///     final: [VerifySuccess]
/// }
///
/// let state = Login::VerifySuccess {
///     user_id: "u1".to_string(),
///     user_name: "ADMIN".to_string(),
/// };
/// assert_eq!(state.kind(), LoginKind::VerifySuccess);
/// assert!(state.is_final());
/// assert_eq!(LoginKind::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! machine_states {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident => $kind:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })?
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field: $ty),* })?
            ),*
        }

        $crate::__machine_kind!($vis $kind { $($variant),* });

        impl $crate::core::State for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant { .. } => $kind::$variant),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final { .. } => true,)*)?
                    _ => false,
                }
            }
        }
    };
}

/// Generate a trigger enum, its [`Kind`](crate::core::Kind) enum and the
/// [`Trigger`](crate::core::Trigger) implementation.
///
/// Struct variant fields are the trigger's arguments.
///
/// ```
/// use stepwise::core::Trigger;
/// use stepwise::machine_triggers;
///
/// machine_triggers! {
///     pub enum LoginTrigger => LoginTriggerKind {
///         Verify { email: String, password: String },
///         Retry,
///     }
/// }
///
/// assert_eq!(LoginTrigger::Retry.kind(), LoginTriggerKind::Retry);
/// ```
#[macro_export]
macro_rules! machine_triggers {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident => $kind:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field: $ty),* })?
            ),*
        }

        $crate::__machine_kind!($vis $kind { $($variant),* });

        impl $crate::core::Trigger for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant { .. } => $kind::$variant),*
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __machine_kind {
    ($vis:vis $kind:ident { $($variant:ident),* }) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $kind {
            $($variant),*
        }

        impl $crate::core::Kind for $kind {
            const ALL: &'static [Self] = &[$(Self::$variant),*];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl std::fmt::Display for $kind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::core::Kind::as_str(self))
            }
        }
    };
}
