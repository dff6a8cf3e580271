//! [`CycleStateMapping`] – step through a fixed list of values on each press.
//!
//! Used for operator-selectable modes that are not commands at all, such as
//! enabling the CV on-target governor with `R`.  On every false → true edge
//! the index advances modulo N and the setter receives the new value.  The
//! mapping never touches subsystem ownership.

use std::rc::Rc;

use robocmd_kernel::{CommandHandle, CommandScheduler};
use robocmd_types::{RemoteState, RoboError};
use tracing::debug;

use crate::map_state::RemoteMapState;
use crate::mapping::{CommandMapping, MappingKind};

pub struct CycleStateMapping<T> {
    map_state: RemoteMapState,
    values: Vec<T>,
    index: usize,
    setter: Box<dyn FnMut(T)>,
    held: bool,
}

impl<T: Clone + std::fmt::Debug + 'static> CycleStateMapping<T> {
    /// `values[0]` is taken as the current value; the first press selects
    /// `values[1]` (or `values[0]` again when there is only one).
    ///
    /// # Errors
    ///
    /// [`RoboError::InvalidMapping`] when `values` is empty.
    pub fn new(
        map_state: RemoteMapState,
        values: Vec<T>,
        setter: impl FnMut(T) + 'static,
    ) -> Result<Self, RoboError> {
        if values.is_empty() {
            return Err(RoboError::InvalidMapping(format!(
                "cycle mapping on {map_state} has no values"
            )));
        }
        Ok(Self {
            map_state,
            values,
            index: 0,
            setter: Box::new(setter),
            held: false,
        })
    }

    /// Bind the setter to a method on a shared target with interior
    /// mutability, e.g. `CvOnTargetGovernor::set_enabled`.
    pub fn bound<O: 'static>(
        map_state: RemoteMapState,
        values: Vec<T>,
        target: Rc<O>,
        set: fn(&O, T),
    ) -> Result<Self, RoboError> {
        Self::new(map_state, values, move |value| set(&target, value))
    }

    pub fn current(&self) -> &T {
        &self.values[self.index]
    }
}

impl<T: Clone + std::fmt::Debug + 'static> CommandMapping for CycleStateMapping<T> {
    fn kind(&self) -> MappingKind {
        MappingKind::Cycle
    }

    fn map_state(&self) -> &RemoteMapState {
        &self.map_state
    }

    fn commands(&self) -> &[CommandHandle] {
        &[]
    }

    fn execute_mapping(&mut self, remote: &RemoteState, _scheduler: &mut CommandScheduler) {
        let now = self.map_state.matches(remote);
        let rising = now && !self.held;
        self.held = now;
        if rising {
            self.index = (self.index + 1) % self.values.len();
            let value = self.values[self.index].clone();
            debug!(mapping = %self.map_state, value = ?value, "cycled state");
            (self.setter)(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use robocmd_types::Key;

    use super::*;

    fn r_pressed(pressed: bool) -> RemoteState {
        let mut remote = RemoteState::default();
        if pressed {
            remote.keys.insert(Key::R);
        }
        remote
    }

    #[test]
    fn empty_value_list_is_rejected() {
        let result = CycleStateMapping::<bool>::new(RemoteMapState::new(), vec![], |_| {});
        assert!(matches!(result, Err(RoboError::InvalidMapping(_))));
    }

    #[test]
    fn advances_modulo_n_on_each_press() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut mapping = CycleStateMapping::new(
            RemoteMapState::new().keys([Key::R]),
            vec![1u8, 2, 3],
            move |v| sink.borrow_mut().push(v),
        )
        .unwrap();
        let mut scheduler = CommandScheduler::new();

        for pressed in [true, true, false, true, false, true, false, true] {
            mapping.execute_mapping(&r_pressed(pressed), &mut scheduler);
        }
        assert_eq!(*seen.borrow(), vec![2, 3, 1, 2]);
        assert_eq!(*mapping.current(), 2);
        assert_eq!(scheduler.scheduled_count(), 0);
    }

    struct Flag(Cell<bool>);

    impl Flag {
        fn set(&self, value: bool) {
            self.0.set(value);
        }
    }

    #[test]
    fn bound_setter_updates_shared_target() {
        let flag = Rc::new(Flag(Cell::new(false)));
        let mut mapping = CycleStateMapping::bound(
            RemoteMapState::new().keys([Key::R]),
            vec![false, true],
            flag.clone(),
            Flag::set,
        )
        .unwrap();
        let mut scheduler = CommandScheduler::new();

        mapping.execute_mapping(&r_pressed(true), &mut scheduler);
        assert!(flag.0.get());
        mapping.execute_mapping(&r_pressed(false), &mut scheduler);
        mapping.execute_mapping(&r_pressed(true), &mut scheduler);
        assert!(!flag.0.get());
    }
}
