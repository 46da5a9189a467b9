//! Machine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings of a machine.
///
/// All fields have defaults, so a partial document deserializes:
///
/// ```rust
/// use stepwise::machine::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "name": "login" }"#).unwrap();
/// assert_eq!(config.name, "login");
/// assert!(config.deadline.is_none());
/// assert!(config.record_history);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Name attached to every log event of the machine
    pub name: String,

    /// Upper bound for a single trigger execution. `None` waits forever.
    ///
    /// Enforcing a deadline needs a tokio runtime with the time driver.
    pub deadline: Option<Duration>,

    /// Keep committed transitions in the machine's history
    pub record_history: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "machine".to_string(),
            deadline: None,
            record_history: true,
        }
    }
}
