//! [`Subsystem`] – a unit of exclusive hardware ownership.
//!
//! A subsystem wraps one or more actuators (see `robocmd-hal`) and exposes a
//! periodic [`Subsystem::refresh`] that pumps them.  Commands mutate the
//! subsystem's setpoints; the subsystem turns setpoints into outputs.
//!
//! Subsystems are built once by the composition root and shared with the
//! commands that drive them through `Rc<RefCell<_>>`.  The scheduler only
//! sees them through a type-erased [`SubsystemHandle`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use robocmd_types::SubsystemId;

pub trait Subsystem {
    /// Stable identity; also used as the display name.
    fn id(&self) -> &SubsystemId;

    /// Called once per tick before the owning command executes.
    fn refresh(&mut self) {}

    /// Called instead of [`refresh`](Subsystem::refresh) while the scheduler
    /// is in safe-disconnect mode.  Implementations should drive every
    /// actuator to a safe (normally zero) output.
    fn refresh_safe_disconnect(&mut self) {
        self.refresh();
    }

    /// Whether the underlying hardware is reachable.  The scheduler refreshes
    /// an offline subsystem through
    /// [`refresh_safe_disconnect`](Subsystem::refresh_safe_disconnect).
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared, type-erased reference to a registered subsystem.
#[derive(Clone)]
pub struct SubsystemHandle {
    id: SubsystemId,
    cell: Rc<RefCell<dyn Subsystem>>,
}

impl SubsystemHandle {
    /// Take ownership of `subsystem` and wrap it in a fresh handle.
    pub fn new<S: Subsystem + 'static>(subsystem: S) -> Self {
        Self::from_shared(Rc::new(RefCell::new(subsystem)))
    }

    /// Wrap a subsystem that commands already hold a typed reference to.
    pub fn from_shared<S: Subsystem + 'static>(shared: Rc<RefCell<S>>) -> Self {
        let id = shared.borrow().id().clone();
        Self { id, cell: shared }
    }

    pub fn id(&self) -> &SubsystemId {
        &self.id
    }

    pub fn borrow(&self) -> Ref<'_, dyn Subsystem> {
        self.cell.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Subsystem> {
        self.cell.borrow_mut()
    }
}

impl fmt::Debug for SubsystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        id: SubsystemId,
        refreshes: u32,
        safe_refreshes: u32,
    }

    impl Subsystem for Counter {
        fn id(&self) -> &SubsystemId {
            &self.id
        }

        fn refresh(&mut self) {
            self.refreshes += 1;
        }

        fn refresh_safe_disconnect(&mut self) {
            self.safe_refreshes += 1;
        }
    }

    #[test]
    fn handle_shares_state_with_typed_reference() {
        let typed = Rc::new(RefCell::new(Counter {
            id: "feeder".into(),
            refreshes: 0,
            safe_refreshes: 0,
        }));
        let handle = SubsystemHandle::from_shared(typed.clone());
        assert_eq!(handle.id().as_str(), "feeder");

        handle.borrow_mut().refresh();
        handle.borrow_mut().refresh_safe_disconnect();
        assert_eq!(typed.borrow().refreshes, 1);
        assert_eq!(typed.borrow().safe_refreshes, 1);
    }

    #[test]
    fn default_hooks_are_online_and_forward_refresh() {
        struct Plain(SubsystemId, u32);
        impl Subsystem for Plain {
            fn id(&self) -> &SubsystemId {
                &self.0
            }
            fn refresh(&mut self) {
                self.1 += 1;
            }
        }

        let typed = Rc::new(RefCell::new(Plain("buzzer".into(), 0)));
        let handle = SubsystemHandle::from_shared(typed.clone());
        assert!(handle.borrow().is_online());
        handle.borrow_mut().refresh_safe_disconnect();
        assert_eq!(typed.borrow().1, 1);
    }
}
