//! [`CommandMapper`] – the ordered mapping table evaluated once per tick.
//!
//! Mappings are evaluated in registration order.  When two mappings fire in
//! the same tick and target overlapping subsystems, the later one's
//! `add_command` interrupts the earlier one, so registration order is the
//! priority order.

use robocmd_kernel::CommandScheduler;
use robocmd_types::{RemoteState, RoboError};
use tracing::{info, trace, warn};

use crate::mapping::CommandMapping;

#[derive(Default)]
pub struct CommandMapper {
    mappings: Vec<Box<dyn CommandMapping>>,
}

impl CommandMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping.
    ///
    /// # Errors
    ///
    /// [`RoboError::DuplicateMapping`] when a mapping of the same kind, with
    /// the same predicate and the same target commands, is already present.
    /// Mappings without commands (cycle mappings) are never duplicates.
    pub fn add_map(&mut self, mapping: Box<dyn CommandMapping>) -> Result<(), RoboError> {
        let duplicate = !mapping.commands().is_empty()
            && self
                .mappings
                .iter()
                .any(|m| same(m.as_ref(), mapping.as_ref()));
        if duplicate {
            let desc = format!("{:?} on {}", mapping.kind(), mapping.map_state());
            warn!(mapping = %desc, "rejected duplicate mapping");
            return Err(RoboError::DuplicateMapping(desc));
        }
        info!(
            kind = ?mapping.kind(),
            on = %mapping.map_state(),
            commands = mapping.commands().len(),
            "mapping registered"
        );
        self.mappings.push(mapping);
        Ok(())
    }

    /// Evaluate every mapping against `remote`, in registration order.
    pub fn handle_state(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        trace!(mappings = self.mappings.len(), "evaluating mappings");
        for mapping in &mut self.mappings {
            mapping.execute_mapping(remote, scheduler);
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn same(a: &dyn CommandMapping, b: &dyn CommandMapping) -> bool {
    a.kind() == b.kind()
        && a.map_state() == b.map_state()
        && a.commands().len() == b.commands().len()
        && a.commands().iter().zip(b.commands()).all(|(x, y)| x == y)
}
