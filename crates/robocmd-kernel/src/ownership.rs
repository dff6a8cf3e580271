//! [`OwnershipTable`] – the subsystem → command ownership map.
//!
//! Enforces the core exclusion invariant: every subsystem has at most one
//! owning command.  Acquisition is all-or-nothing; if any subsystem in the
//! requested set is held by a different command the whole request is
//! rejected with [`RoboError::OwnershipConflict`] and nothing changes.

use std::collections::HashMap;

use robocmd_types::{RoboError, SubsystemId};

use crate::command::CommandId;

/// # Example
///
/// ```
/// use robocmd_kernel::OwnershipTable;
/// use robocmd_kernel::CommandHandle;
/// # use robocmd_kernel::Command;
/// # use robocmd_types::SubsystemId;
/// # struct Spin(Vec<SubsystemId>);
/// # impl Command for Spin {
/// #     fn name(&self) -> &str { "spin" }
/// #     fn requirements(&self) -> &[SubsystemId] { &self.0 }
/// #     fn execute(&mut self) {}
/// #     fn is_finished(&self) -> bool { false }
/// # }
///
/// let spin = CommandHandle::new(Spin(vec!["chassis".into()]));
/// let mut table = OwnershipTable::new();
/// table.acquire_all(&spin.requirements(), spin.id()).unwrap();
///
/// assert_eq!(table.owner_of(&"chassis".into()), Some(spin.id()));
/// table.release_all(spin.id());
/// assert!(table.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct OwnershipTable {
    owners: HashMap<SubsystemId, CommandId>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, subsystem: &SubsystemId) -> Option<CommandId> {
        self.owners.get(subsystem).copied()
    }

    /// Distinct owners of `subsystems`, in the order they are first seen.
    pub fn owners_of(&self, subsystems: &[SubsystemId]) -> Vec<CommandId> {
        let mut found = Vec::new();
        for sub in subsystems {
            if let Some(owner) = self.owner_of(sub)
                && !found.contains(&owner)
            {
                found.push(owner);
            }
        }
        found
    }

    /// Give `command` every subsystem in `subsystems`, or none of them.
    ///
    /// Subsystems already owned by `command` itself are not a conflict.
    pub fn acquire_all(
        &mut self,
        subsystems: &[SubsystemId],
        command: CommandId,
    ) -> Result<(), RoboError> {
        if let Some(taken) = subsystems
            .iter()
            .find(|sub| matches!(self.owner_of(sub), Some(owner) if owner != command))
        {
            return Err(RoboError::OwnershipConflict(taken.clone()));
        }
        for sub in subsystems {
            self.owners.insert(sub.clone(), command);
        }
        Ok(())
    }

    /// Release everything `command` owns and return the freed subsystems
    /// (sorted for stable logging).
    pub fn release_all(&mut self, command: CommandId) -> Vec<SubsystemId> {
        let freed = self.owned_by(command);
        for sub in &freed {
            self.owners.remove(sub);
        }
        freed
    }

    pub fn owned_by(&self, command: CommandId) -> Vec<SubsystemId> {
        let mut owned: Vec<SubsystemId> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == command)
            .map(|(sub, _)| sub.clone())
            .collect();
        owned.sort();
        owned
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
