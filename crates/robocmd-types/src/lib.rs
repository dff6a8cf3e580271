//! `robocmd-types` – shared value types for the command stack.
//!
//! Everything that crosses a crate boundary lives here: subsystem identity,
//! command lifecycle states, the sampled remote-input snapshot, and the
//! global [`RoboError`] enum.

pub mod remote;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use remote::{Key, KeySet, MouseButton, RemoteState, Switch, SwitchState};

/// Stable identity of a subsystem, e.g. `"chassis"` or `"turret"`.
///
/// The scheduler uses this as the unit of mutual exclusion: at most one
/// command may own a given id at any tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsystemId(String);

impl SubsystemId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubsystemId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a command as tracked by the scheduler.
///
/// `Idle -> Initializing -> Running -> Ending -> Idle`, once per scheduling
/// episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandState {
    #[default]
    Idle,
    Initializing,
    Running,
    Ending,
}

/// How a command's most recent episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// `is_finished()` returned true (includes governor denial).
    Finished,
    /// Displaced by another command, removed by a caller, or swept by a
    /// safe disconnect.
    Interrupted,
}

impl EndReason {
    pub fn from_interrupted(interrupted: bool) -> Self {
        if interrupted {
            EndReason::Interrupted
        } else {
            EndReason::Finished
        }
    }
}

/// Global error type for registration, scheduling and hardware faults.
///
/// None of these are fatal to the control loop: callers log them and carry
/// on with the previous state.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoboError {
    #[error("Subsystem already registered: {0}")]
    DuplicateSubsystem(SubsystemId),

    #[error("Subsystem not registered: {0}")]
    UnregisteredSubsystem(SubsystemId),

    #[error("Command '{0}' declares no subsystem requirements")]
    NoRequirements(String),

    #[error("Command '{0}' is not ready to be scheduled")]
    NotReady(String),

    #[error("Scheduler is in safe-disconnect mode; rejected '{0}'")]
    Disconnected(String),

    #[error("Default command '{command}' does not require subsystem {subsystem}")]
    DefaultCommandMismatch {
        subsystem: SubsystemId,
        command: String,
    },

    #[error("Subsystem {0} is already owned by another command")]
    OwnershipConflict(SubsystemId),

    #[error("Command mapping already registered: {0}")]
    DuplicateMapping(String),

    #[error("Invalid command mapping: {0}")]
    InvalidMapping(String),

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },
}
