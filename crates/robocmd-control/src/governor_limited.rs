//! [`GovernorLimitedCommand`] – run an inner command only while every
//! governor permits it.
//!
//! The wrapper is what the scheduler sees.  Each tick its `execute` checks
//! the [`GovernorSet`] **before** forwarding:
//!
//! 1. Any governor finished → the tick is denied: the inner command does not
//!    execute and the wrapper reports `is_finished() == true`, so the
//!    scheduler ends it (`end(false)`, forwarded to the inner command) in the
//!    same `run()`.
//! 2. Otherwise the inner command executes and the wrapper finishes when the
//!    inner command does.
//!
//! `is_ready` is "all governors ready AND inner ready", so a denied request
//! never interrupts the current owner of the requirements.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use robocmd_control::{FnGovernor, GovernorLimitedCommand, GovernorSet};
//! use robocmd_kernel::{Command, CommandHandle};
//! use robocmd_types::SubsystemId;
//!
//! struct Fire(Vec<SubsystemId>);
//! impl Command for Fire {
//!     fn name(&self) -> &str { "fire" }
//!     fn requirements(&self) -> &[SubsystemId] { &self.0 }
//!     fn execute(&mut self) {}
//!     fn is_finished(&self) -> bool { false }
//! }
//!
//! let cool = Rc::new(Cell::new(true));
//! let flag = cool.clone();
//! let fire = CommandHandle::new(Fire(vec!["agitator".into()]));
//! let mut gated = GovernorLimitedCommand::new(
//!     "fire_limited",
//!     fire,
//!     GovernorSet::new().with(FnGovernor::new("heat", move || flag.get())),
//! );
//!
//! gated.execute();
//! assert!(!gated.is_finished());
//! cool.set(false);
//! gated.execute();
//! assert!(gated.is_finished());
//! ```

use robocmd_kernel::{Command, CommandHandle};
use robocmd_types::SubsystemId;
use tracing::debug;

use crate::governor::GovernorSet;

pub struct GovernorLimitedCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    inner: CommandHandle,
    governors: GovernorSet,
    denied: bool,
}

impl GovernorLimitedCommand {
    /// Gate `inner`, arbitrating over the inner command's own requirements.
    pub fn new(name: impl Into<String>, inner: CommandHandle, governors: GovernorSet) -> Self {
        let requirements = inner.requirements();
        Self::with_requirements(name, inner, requirements, governors)
    }

    /// Gate `inner`, arbitrating over an explicit requirement set (which may
    /// be a subset of the inner command's).
    pub fn with_requirements(
        name: impl Into<String>,
        inner: CommandHandle,
        requirements: Vec<SubsystemId>,
        governors: GovernorSet,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            inner,
            governors,
            denied: false,
        }
    }

    pub fn inner(&self) -> &CommandHandle {
        &self.inner
    }

    /// Whether the last `execute` was denied by a governor.
    pub fn was_denied(&self) -> bool {
        self.denied
    }
}

impl Command for GovernorLimitedCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.governors.all_ready() && self.inner.borrow().is_ready()
    }

    fn initialize(&mut self) {
        self.denied = false;
        self.governors.notify_initialized();
        self.inner.borrow_mut().initialize();
    }

    fn execute(&mut self) {
        if let Some(governor) = self.governors.first_finished() {
            debug!(command = %self.name, governor, "governor denied command");
            self.denied = true;
            return;
        }
        self.inner.borrow_mut().execute();
    }

    fn is_finished(&self) -> bool {
        self.denied || self.inner.borrow().is_finished()
    }

    fn end(&mut self, interrupted: bool) {
        self.inner.borrow_mut().end(interrupted);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use robocmd_types::EndReason;

    use super::*;
    use crate::governor::{FnGovernor, Governor};
    use crate::test_support::{self, Recorder};

    fn gate(flag: &Rc<Cell<bool>>) -> GovernorSet {
        let flag = flag.clone();
        GovernorSet::new().with(FnGovernor::new("heat", move || flag.get()))
    }

    #[test]
    fn heat_revocation_scenario() {
        let log = test_support::log();
        let mut scheduler = test_support::scheduler(&["agitator"]);
        let idle = Recorder::new("idle", &["agitator"], &log).handle();
        scheduler
            .set_default_command(&"agitator".into(), idle.clone())
            .unwrap();

        let heat_ok = Rc::new(Cell::new(true));
        let fire = Recorder::new("fire", &["agitator"], &log).handle();
        let limited = CommandHandle::new(GovernorLimitedCommand::new("fire_limited", fire, gate(&heat_ok)));
        scheduler.add_command(&limited).unwrap();
        test_support::take(&log);

        for _ in 0..10 {
            scheduler.run();
        }
        assert_eq!(test_support::take(&log), vec!["fire.exec"; 10]);

        // Tick 10: denied, ended cleanly, and the default is scheduled at the
        // end of the same run.
        heat_ok.set(false);
        scheduler.run();
        assert_eq!(test_support::take(&log), vec!["fire.end(false)", "idle.init"]);
        assert_eq!(scheduler.last_end_reason(&limited), Some(EndReason::Finished));
        assert_eq!(scheduler.owner_of(&"agitator".into()), Some(idle));
    }

    #[test]
    fn denied_request_does_not_interrupt_owner() {
        let log = test_support::log();
        let mut scheduler = test_support::scheduler(&["agitator"]);
        let idle = Recorder::new("idle", &["agitator"], &log).handle();
        scheduler.add_command(&idle).unwrap();

        let heat_ok = Rc::new(Cell::new(false));
        let fire = Recorder::new("fire", &["agitator"], &log).handle();
        let limited = CommandHandle::new(GovernorLimitedCommand::new("fire_limited", fire, gate(&heat_ok)));
        assert!(scheduler.add_command(&limited).is_err());
        assert_eq!(scheduler.owner_of(&"agitator".into()), Some(idle));
    }

    #[test]
    fn inner_finish_finishes_wrapper() {
        let log = test_support::log();
        let heat_ok = Rc::new(Cell::new(true));
        let fire = Recorder::new("fire", &["agitator"], &log).finishing_after(2).handle();
        let mut limited = GovernorLimitedCommand::new("fire_limited", fire, gate(&heat_ok));

        limited.initialize();
        limited.execute();
        assert!(!limited.is_finished());
        limited.execute();
        assert!(limited.is_finished());
        assert!(!limited.was_denied());
    }

    #[test]
    fn reinitialize_clears_denial() {
        let log = test_support::log();
        let heat_ok = Rc::new(Cell::new(false));
        let fire = Recorder::new("fire", &["agitator"], &log).handle();
        let mut limited = GovernorLimitedCommand::new("fire_limited", fire, gate(&heat_ok));

        limited.execute();
        assert!(limited.was_denied());
        heat_ok.set(true);
        limited.initialize();
        assert!(!limited.is_finished());
    }

    #[test]
    fn explicit_requirements_may_be_a_subset() {
        let log = test_support::log();
        let inner = Recorder::new("aim_and_fire", &["turret", "agitator"], &log).handle();
        let limited = GovernorLimitedCommand::with_requirements(
            "fire_only",
            inner,
            vec!["agitator".into()],
            GovernorSet::new(),
        );
        assert_eq!(limited.requirements(), &[SubsystemId::from("agitator")]);
        assert!(limited.is_ready());
    }

    /// Finishes once the shared counter moves past its value at start.
    struct CountedSinceStart {
        counter: Rc<Cell<u32>>,
        baseline: Cell<u32>,
    }

    impl Governor for CountedSinceStart {
        fn name(&self) -> &str {
            "counted_since_start"
        }
        fn is_ready(&self) -> bool {
            true
        }
        fn is_finished(&self) -> bool {
            self.counter.get() > self.baseline.get()
        }
        fn on_governed_command_initialized(&self) {
            self.baseline.set(self.counter.get());
        }
    }

    #[test]
    fn governors_take_their_baseline_on_initialize() {
        let log = test_support::log();
        let launches = Rc::new(Cell::new(4));
        let governor = Rc::new(CountedSinceStart {
            counter: launches.clone(),
            baseline: Cell::new(0),
        });
        let fire = Recorder::new("fire", &["agitator"], &log).handle();
        let mut limited = GovernorLimitedCommand::new(
            "fire_once",
            fire,
            GovernorSet::new().with_shared(governor),
        );

        limited.initialize();
        limited.execute();
        assert!(!limited.is_finished());

        launches.set(5);
        limited.execute();
        assert!(limited.is_finished());

        // The next episode starts from the new count.
        limited.initialize();
        limited.execute();
        assert!(!limited.is_finished());
    }

    #[test]
    fn inner_not_ready_blocks_wrapper() {
        let log = test_support::log();
        let recorder = Recorder::new("fire", &["agitator"], &log);
        recorder.ready.set(false);
        let limited = GovernorLimitedCommand::new("fire_limited", recorder.handle(), GovernorSet::new());
        assert!(!limited.is_ready());
    }
}
