//! Comprised commands – commands that sequence other commands through a
//! private, nested [`CommandScheduler`].
//!
//! The outer scheduler sees a single opaque command that owns the union of
//! its children's requirements.  Inside, the children compete for those
//! requirements under the usual interruption rules, so switching children is
//! always `old.end(true)` → `new.initialize()` → `new.execute()` within one
//! outer tick.
//!
//! | Type | Behaviour |
//! |------|-----------|
//! | [`AlternatingCommand`] | swaps two children every N ticks; never finishes |
//! | [`TimedSwitchCommand`] | runs a primary child; a condition change arms a switch timer and the other child starts when it expires; finishes when the active child finishes |
//!
//! Timers are [`TickTimeout`]s advanced once per `execute`.

use robocmd_kernel::{Command, CommandHandle, CommandScheduler, TickTimeout};
use robocmd_types::SubsystemId;
use tracing::debug;

/// Requirements of every child, deduplicated, in first-seen order.
pub(crate) fn union_requirements(children: &[&CommandHandle]) -> Vec<SubsystemId> {
    let mut all = Vec::new();
    for child in children {
        for sub in child.requirements() {
            if !all.contains(&sub) {
                all.push(sub);
            }
        }
    }
    all
}

fn start_child(nested: &mut CommandScheduler, parent: &str, child: &CommandHandle) -> bool {
    match nested.add_command(child) {
        Ok(()) => true,
        Err(e) => {
            debug!(command = parent, child = %child.name(), error = %e, "child not started");
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AlternatingCommand
// ────────────────────────────────────────────────────────────────────────────

/// Alternates between two children, switching every `period_ticks`.
pub struct AlternatingCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    children: [CommandHandle; 2],
    active: usize,
    period_ticks: u32,
    switch_timer: TickTimeout,
    nested: CommandScheduler,
}

impl AlternatingCommand {
    pub fn new(
        name: impl Into<String>,
        first: CommandHandle,
        second: CommandHandle,
        period_ticks: u32,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: union_requirements(&[&first, &second]),
            children: [first, second],
            active: 0,
            period_ticks,
            switch_timer: TickTimeout::stopped(),
            nested: CommandScheduler::nested(),
        }
    }

    /// The child that was most recently started.
    pub fn active_child(&self) -> &CommandHandle {
        &self.children[self.active]
    }
}

impl Command for AlternatingCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self) {
        self.active = 0;
        start_child(&mut self.nested, &self.name, &self.children[0]);
        self.switch_timer.restart(self.period_ticks);
    }

    fn execute(&mut self) {
        if self.switch_timer.advance() {
            self.active = 1 - self.active;
            start_child(&mut self.nested, &self.name, &self.children[self.active]);
            self.switch_timer.restart(self.period_ticks);
        }
        self.nested.run();
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, interrupted: bool) {
        self.nested.remove_all_commands(interrupted);
        self.switch_timer.stop();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TimedSwitchCommand
// ────────────────────────────────────────────────────────────────────────────

/// Runs `primary` until `condition` turns true, then switches to `secondary`
/// `delay_ticks` later; switches back the same way once it turns false.
///
/// The switch is latched when the timer is armed: the condition is not
/// re-read until the timer expires, so flicker inside the window neither
/// cancels nor restarts it.  The agitator's move/unjam pair is the canonical
/// use: move until a jam is detected, unjam until it clears.
pub struct TimedSwitchCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    primary: CommandHandle,
    secondary: CommandHandle,
    condition: Box<dyn Fn() -> bool>,
    delay_ticks: u32,
    switch_timer: TickTimeout,
    on_secondary: bool,
    nested: CommandScheduler,
}

impl TimedSwitchCommand {
    pub fn new(
        name: impl Into<String>,
        primary: CommandHandle,
        secondary: CommandHandle,
        condition: impl Fn() -> bool + 'static,
        delay_ticks: u32,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: union_requirements(&[&primary, &secondary]),
            primary,
            secondary,
            condition: Box::new(condition),
            delay_ticks,
            switch_timer: TickTimeout::stopped(),
            on_secondary: false,
            nested: CommandScheduler::nested(),
        }
    }

    pub fn is_on_secondary(&self) -> bool {
        self.on_secondary
    }
}

impl Command for TimedSwitchCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.primary.borrow().is_ready()
    }

    fn initialize(&mut self) {
        self.on_secondary = false;
        self.switch_timer.stop();
        start_child(&mut self.nested, &self.name, &self.primary);
    }

    fn execute(&mut self) {
        if self.switch_timer.is_stopped() && (self.condition)() != self.on_secondary {
            self.switch_timer.restart(self.delay_ticks);
        }
        if self.switch_timer.advance() {
            let to_secondary = !self.on_secondary;
            let next = if to_secondary {
                &self.secondary
            } else {
                &self.primary
            };
            if start_child(&mut self.nested, &self.name, next) {
                debug!(command = %self.name, secondary = to_secondary, "switched child");
                self.on_secondary = to_secondary;
            }
        }
        self.nested.run();
    }

    fn is_finished(&self) -> bool {
        self.nested.scheduled_count() == 0
    }

    fn end(&mut self, interrupted: bool) {
        self.nested.remove_all_commands(interrupted);
        self.switch_timer.stop();
    }
}
