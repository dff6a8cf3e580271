//! [`GovernorWithFallbackCommand`] – run a primary command while its
//! governors permit it, otherwise a fallback command.
//!
//! Unlike [`GovernorLimitedCommand`](crate::GovernorLimitedCommand), denial
//! does not finish the wrapper.  The wrapper switches children inside its own
//! `execute`, using the same discipline as the scheduler: the outgoing child
//! gets `end(true)` before the incoming child's `initialize`, and the incoming
//! child executes in that same tick.
//!
//! The wrapper requires the union of both children's requirements.

use robocmd_kernel::{Command, CommandHandle};
use robocmd_types::SubsystemId;
use tracing::debug;

use crate::comprised::union_requirements;
use crate::governor::GovernorSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveChild {
    Primary,
    Fallback,
}

pub struct GovernorWithFallbackCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    primary: CommandHandle,
    fallback: CommandHandle,
    governors: GovernorSet,
    active: ActiveChild,
}

impl GovernorWithFallbackCommand {
    pub fn new(
        name: impl Into<String>,
        primary: CommandHandle,
        fallback: CommandHandle,
        governors: GovernorSet,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: union_requirements(&[&primary, &fallback]),
            primary,
            fallback,
            governors,
            active: ActiveChild::Fallback,
        }
    }

    pub fn active(&self) -> ActiveChild {
        self.active
    }

    fn child(&self, which: ActiveChild) -> &CommandHandle {
        match which {
            ActiveChild::Primary => &self.primary,
            ActiveChild::Fallback => &self.fallback,
        }
    }

    fn primary_permitted(&self) -> bool {
        self.governors.all_ready() && self.primary.borrow().is_ready()
    }

    fn switch_to(&mut self, next: ActiveChild) {
        if next == self.active {
            return;
        }
        debug!(command = %self.name, from = ?self.active, to = ?next, "switching child");
        self.child(self.active).borrow_mut().end(true);
        self.active = next;
        if next == ActiveChild::Primary {
            self.governors.notify_initialized();
        }
        self.child(next).borrow_mut().initialize();
    }
}

impl Command for GovernorWithFallbackCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.primary_permitted() || self.fallback.borrow().is_ready()
    }

    fn initialize(&mut self) {
        self.active = if self.primary_permitted() {
            ActiveChild::Primary
        } else {
            ActiveChild::Fallback
        };
        if self.active == ActiveChild::Primary {
            self.governors.notify_initialized();
        }
        self.child(self.active).borrow_mut().initialize();
    }

    fn execute(&mut self) {
        let active = self.active;
        match active {
            ActiveChild::Primary if self.governors.any_finished() => {
                self.switch_to(ActiveChild::Fallback)
            }
            ActiveChild::Fallback if self.primary_permitted() => {
                self.switch_to(ActiveChild::Primary)
            }
            _ => {}
        }
        self.child(self.active).borrow_mut().execute();
    }

    fn is_finished(&self) -> bool {
        self.child(self.active).borrow().is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        self.child(self.active).borrow_mut().end(interrupted);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::governor::FnGovernor;
    use crate::test_support::{self, Recorder};

    fn build(flag: &Rc<Cell<bool>>, log: &test_support::Log) -> GovernorWithFallbackCommand {
        let flag = flag.clone();
        GovernorWithFallbackCommand::new(
            "turret_cv_or_user",
            Recorder::new("cv", &["turret"], log).handle(),
            Recorder::new("user", &["turret"], log).handle(),
            GovernorSet::new().with(FnGovernor::new("target", move || flag.get())),
        )
    }

    #[test]
    fn starts_on_primary_when_permitted() {
        let log = test_support::log();
        let target = Rc::new(Cell::new(true));
        let mut cmd = build(&target, &log);
        cmd.initialize();
        cmd.execute();
        assert_eq!(cmd.active(), ActiveChild::Primary);
        assert_eq!(test_support::take(&log), vec!["cv.init", "cv.exec"]);
    }

    #[test]
    fn switches_with_one_tick_interruption() {
        let log = test_support::log();
        let target = Rc::new(Cell::new(false));
        let mut cmd = build(&target, &log);
        cmd.initialize();
        cmd.execute();
        assert_eq!(test_support::take(&log), vec!["user.init", "user.exec"]);

        target.set(true);
        cmd.execute();
        assert_eq!(
            test_support::take(&log),
            vec!["user.end(true)", "cv.init", "cv.exec"]
        );

        target.set(false);
        cmd.execute();
        assert_eq!(
            test_support::take(&log),
            vec!["cv.end(true)", "user.init", "user.exec"]
        );
    }

    #[test]
    fn end_goes_to_active_child_only() {
        let log = test_support::log();
        let target = Rc::new(Cell::new(true));
        let mut cmd = build(&target, &log);
        cmd.initialize();
        test_support::take(&log);
        cmd.end(true);
        assert_eq!(test_support::take(&log), vec!["cv.end(true)"]);
    }

    #[test]
    fn requirements_are_the_union() {
        let log = test_support::log();
        let cmd = GovernorWithFallbackCommand::new(
            "mixed",
            Recorder::new("a", &["turret", "chassis"], &log).handle(),
            Recorder::new("b", &["turret", "agitator"], &log).handle(),
            GovernorSet::new(),
        );
        let reqs: Vec<&str> = cmd.requirements().iter().map(|s| s.as_str()).collect();
        assert_eq!(reqs, vec!["turret", "chassis", "agitator"]);
    }

    #[test]
    fn runs_as_default_command_under_scheduler() {
        let log = test_support::log();
        let target = Rc::new(Cell::new(false));
        let mut scheduler = test_support::scheduler(&["turret"]);
        let cmd = CommandHandle::new(build(&target, &log));
        scheduler.set_default_command(&"turret".into(), cmd.clone()).unwrap();

        scheduler.run();
        scheduler.run();
        target.set(true);
        scheduler.run();
        assert_eq!(
            test_support::take(&log),
            vec!["user.init", "user.exec", "user.end(true)", "cv.init", "cv.exec"]
        );
        assert!(scheduler.is_command_scheduled(&cmd));
    }
}
