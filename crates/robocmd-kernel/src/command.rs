//! [`Command`] – an action with a bounded lifecycle that requires exclusive
//! ownership of one or more subsystems.
//!
//! The scheduler drives every command through
//! `initialize → execute* → end(interrupted)`.  A command instance is
//! reusable: once it has ended it may be scheduled again.
//!
//! Commands are shared between the scheduler, mappings and wrapper commands
//! through a [`CommandHandle`].  Two handles built from the same
//! `Rc<RefCell<_>>` compare equal and have the same [`CommandId`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use robocmd_types::SubsystemId;

pub trait Command {
    /// Display name used in logs.
    fn name(&self) -> &str;

    /// Subsystems this command must own while it runs.  Must be non-empty.
    fn requirements(&self) -> &[SubsystemId];

    /// Whether the command may be scheduled right now.  A command that is not
    /// ready is rejected by `add_command` without interrupting anything.
    fn is_ready(&self) -> bool {
        true
    }

    /// Called once when the command takes ownership.
    fn initialize(&mut self) {}

    /// Called once per tick while the command owns its subsystems.
    fn execute(&mut self);

    /// Called after every `execute`; returning `true` ends the command with
    /// `interrupted = false`.
    fn is_finished(&self) -> bool;

    /// Called once when the command stops running.  `interrupted` is `true`
    /// when it was displaced or removed rather than finishing by itself.
    fn end(&mut self, _interrupted: bool) {}
}

/// Identity of a shared command instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

/// Shared, type-erased reference to a command.
#[derive(Clone)]
pub struct CommandHandle {
    cell: Rc<RefCell<dyn Command>>,
}

impl CommandHandle {
    /// Take ownership of `command` and wrap it in a fresh handle.
    pub fn new<C: Command + 'static>(command: C) -> Self {
        Self {
            cell: Rc::new(RefCell::new(command)),
        }
    }

    /// Wrap a command that other code keeps a typed reference to (for
    /// example a governor that inspects it).
    pub fn from_shared<C: Command + 'static>(shared: Rc<RefCell<C>>) -> Self {
        Self { cell: shared }
    }

    /// Address of the shared cell.  Stable for as long as any strong or weak
    /// reference to the command exists.
    pub fn id(&self) -> CommandId {
        CommandId(Rc::as_ptr(&self.cell) as *const () as usize)
    }

    /// Weak reference that pins the command's address without keeping the
    /// command alive.
    pub(crate) fn downgrade(&self) -> Weak<RefCell<dyn Command>> {
        Rc::downgrade(&self.cell)
    }

    pub fn name(&self) -> String {
        match self.cell.try_borrow() {
            Ok(cmd) => cmd.name().to_string(),
            Err(_) => "<busy>".to_string(),
        }
    }

    /// Owned copy of the requirement list.
    pub fn requirements(&self) -> Vec<SubsystemId> {
        self.cell.borrow().requirements().to_vec()
    }

    pub fn borrow(&self) -> Ref<'_, dyn Command> {
        self.cell.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Command> {
        self.cell.borrow_mut()
    }
}

impl PartialEq for CommandHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for CommandHandle {}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop {
        requirements: Vec<SubsystemId>,
        executed: u32,
    }

    impl Command for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        fn requirements(&self) -> &[SubsystemId] {
            &self.requirements
        }
        fn execute(&mut self) {
            self.executed += 1;
        }
        fn is_finished(&self) -> bool {
            false
        }
    }

    fn noop() -> Noop {
        Noop {
            requirements: vec!["chassis".into()],
            executed: 0,
        }
    }

    #[test]
    fn handles_from_same_cell_share_identity() {
        let typed = Rc::new(RefCell::new(noop()));
        let a = CommandHandle::from_shared(typed.clone());
        let b = CommandHandle::from_shared(typed.clone());
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());

        a.borrow_mut().execute();
        assert_eq!(typed.borrow().executed, 1);
    }

    #[test]
    fn distinct_instances_have_distinct_ids() {
        let a = CommandHandle::new(noop());
        let b = CommandHandle::new(noop());
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn name_and_requirements_are_readable() {
        let h = CommandHandle::new(noop());
        assert_eq!(h.name(), "noop");
        assert_eq!(h.requirements(), vec![SubsystemId::from("chassis")]);
        assert!(h.borrow().is_ready());
    }

    #[test]
    fn name_of_busy_command_does_not_panic() {
        let h = CommandHandle::new(noop());
        let _guard = h.borrow_mut();
        assert_eq!(h.name(), "<busy>");
    }
}
