//! Command mappings – bind a [`RemoteMapState`] predicate to a trigger
//! semantic and a list of commands.
//!
//! | Mapping | Rising edge | While held | Falling edge |
//! |---------|-------------|------------|--------------|
//! | [`PressMapping`] | add commands | – | – |
//! | [`HoldMapping`] | add commands | – | remove (interrupted) |
//! | [`HoldRepeatMapping`] | add commands | re-add commands that finished by themselves | optionally remove |
//! | [`ToggleMapping`] | flip; add when on, remove when off | – | – |
//!
//! [`CycleStateMapping`](crate::CycleStateMapping) lives in its own module
//! since it targets a setter rather than commands.
//!
//! Every mapping remembers whether its predicate matched on the previous
//! evaluation; that single bit is what makes edges well defined.  Errors
//! from `add_command` (not ready, disconnected) are logged and the mapping
//! carries on.

use robocmd_kernel::{CommandHandle, CommandScheduler};
use robocmd_types::{EndReason, RemoteState};
use tracing::debug;

use crate::map_state::RemoteMapState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Press,
    Hold,
    HoldRepeat,
    Toggle,
    Cycle,
}

pub trait CommandMapping {
    fn kind(&self) -> MappingKind;

    fn map_state(&self) -> &RemoteMapState;

    /// Target commands, in the order they are added.  Empty for mappings
    /// that drive a setter instead.
    fn commands(&self) -> &[CommandHandle];

    /// Evaluate against the latest snapshot.  Called once per tick, before
    /// the scheduler runs.
    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler);
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Predicate value plus previous value.
#[derive(Debug, Default, Clone, Copy)]
struct Edge {
    held: bool,
}

impl Edge {
    /// Returns `(rising, falling, now_held)`.
    fn update(&mut self, now: bool) -> (bool, bool, bool) {
        let rising = now && !self.held;
        let falling = !now && self.held;
        self.held = now;
        (rising, falling, now)
    }
}

fn add_all(commands: &[CommandHandle], scheduler: &mut CommandScheduler) {
    for cmd in commands {
        try_add(cmd, scheduler);
    }
}

fn try_add(cmd: &CommandHandle, scheduler: &mut CommandScheduler) -> bool {
    match scheduler.add_command(cmd) {
        Ok(()) => true,
        Err(e) => {
            debug!(command = %cmd.name(), error = %e, "mapping could not add command");
            false
        }
    }
}

fn remove_all(commands: &[CommandHandle], scheduler: &mut CommandScheduler) {
    for cmd in commands {
        scheduler.remove_command(cmd, true);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Press
// ────────────────────────────────────────────────────────────────────────────

/// Adds its commands once per false → true transition.
pub struct PressMapping {
    map_state: RemoteMapState,
    commands: Vec<CommandHandle>,
    edge: Edge,
}

impl PressMapping {
    pub fn new(map_state: RemoteMapState, commands: Vec<CommandHandle>) -> Self {
        Self {
            map_state,
            commands,
            edge: Edge::default(),
        }
    }
}

impl CommandMapping for PressMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Press
    }

    fn map_state(&self) -> &RemoteMapState {
        &self.map_state
    }

    fn commands(&self) -> &[CommandHandle] {
        &self.commands
    }

    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        let (rising, _, _) = self.edge.update(self.map_state.matches(remote));
        if rising {
            add_all(&self.commands, scheduler);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hold
// ────────────────────────────────────────────────────────────────────────────

/// Adds its commands on press and interrupts them on release.
pub struct HoldMapping {
    map_state: RemoteMapState,
    commands: Vec<CommandHandle>,
    edge: Edge,
}

impl HoldMapping {
    pub fn new(map_state: RemoteMapState, commands: Vec<CommandHandle>) -> Self {
        Self {
            map_state,
            commands,
            edge: Edge::default(),
        }
    }
}

impl CommandMapping for HoldMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Hold
    }

    fn map_state(&self) -> &RemoteMapState {
        &self.map_state
    }

    fn commands(&self) -> &[CommandHandle] {
        &self.commands
    }

    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        match self.edge.update(self.map_state.matches(remote)) {
            (true, _, _) => add_all(&self.commands, scheduler),
            (_, true, _) => remove_all(&self.commands, scheduler),
            _ => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HoldRepeat
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepeatState {
    /// Not yet started during this press (or the last add was rejected).
    Pending,
    /// Started at least once during this press.
    Issued,
    /// Interrupted by something else while held; no more repeats until the
    /// predicate is released.
    Suspended,
}

/// Like [`HoldMapping`], but a command that finishes by itself while the
/// predicate is still held is added again on the next evaluation.
///
/// A command that was *interrupted* while held is not re-added until the
/// predicate is released and pressed again, so a higher-priority mapping
/// cannot get into a tug-of-war with a held repeat.
pub struct HoldRepeatMapping {
    map_state: RemoteMapState,
    commands: Vec<CommandHandle>,
    edge: Edge,
    end_when_released: bool,
    max_schedules: Option<u32>,
    states: Vec<RepeatState>,
    schedules: Vec<u32>,
}

impl HoldRepeatMapping {
    pub fn new(map_state: RemoteMapState, commands: Vec<CommandHandle>) -> Self {
        let n = commands.len();
        Self {
            map_state,
            commands,
            edge: Edge::default(),
            end_when_released: true,
            max_schedules: None,
            states: vec![RepeatState::Pending; n],
            schedules: vec![0; n],
        }
    }

    /// Whether releasing the predicate interrupts running commands
    /// (default `true`).  When `false`, the last repeat runs to completion.
    pub fn end_when_released(mut self, end: bool) -> Self {
        self.end_when_released = end;
        self
    }

    /// Cap on how many times each command is scheduled per press.
    pub fn max_schedules(mut self, max: u32) -> Self {
        self.max_schedules = Some(max);
        self
    }

    /// Change the per-press cap at runtime; `None` removes it.  Takes effect
    /// from the next evaluation, including during a press already under way.
    pub fn set_max_schedules(&mut self, max: Option<u32>) {
        self.max_schedules = max;
    }

    /// Times `commands()[index]` was scheduled during the current press.
    pub fn schedules_this_press(&self, index: usize) -> u32 {
        self.schedules.get(index).copied().unwrap_or(0)
    }

    fn reset(&mut self) {
        self.states.fill(RepeatState::Pending);
        self.schedules.fill(0);
    }
}

impl CommandMapping for HoldRepeatMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::HoldRepeat
    }

    fn map_state(&self) -> &RemoteMapState {
        &self.map_state
    }

    fn commands(&self) -> &[CommandHandle] {
        &self.commands
    }

    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        let (rising, falling, held) = self.edge.update(self.map_state.matches(remote));
        if rising {
            self.reset();
        }
        if falling {
            if self.end_when_released {
                remove_all(&self.commands, scheduler);
            }
            self.reset();
            return;
        }
        if !held {
            return;
        }

        for (i, cmd) in self.commands.iter().enumerate() {
            if scheduler.is_command_scheduled(cmd) {
                continue;
            }
            match self.states[i] {
                RepeatState::Suspended => continue,
                RepeatState::Issued
                    if scheduler.last_end_reason(cmd) == Some(EndReason::Interrupted) =>
                {
                    debug!(command = %cmd.name(), "interrupted while held, repeat suspended");
                    self.states[i] = RepeatState::Suspended;
                    continue;
                }
                _ => {}
            }
            if self
                .max_schedules
                .is_some_and(|max| self.schedules[i] >= max)
            {
                continue;
            }
            if try_add(cmd, scheduler) {
                self.states[i] = RepeatState::Issued;
                self.schedules[i] += 1;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Toggle
// ────────────────────────────────────────────────────────────────────────────

/// Flips on every false → true transition.
pub struct ToggleMapping {
    map_state: RemoteMapState,
    commands: Vec<CommandHandle>,
    edge: Edge,
    toggled: bool,
}

impl ToggleMapping {
    pub fn new(map_state: RemoteMapState, commands: Vec<CommandHandle>) -> Self {
        Self {
            map_state,
            commands,
            edge: Edge::default(),
            toggled: false,
        }
    }

    pub fn is_toggled(&self) -> bool {
        self.toggled
    }
}

impl CommandMapping for ToggleMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Toggle
    }

    fn map_state(&self) -> &RemoteMapState {
        &self.map_state
    }

    fn commands(&self) -> &[CommandHandle] {
        &self.commands
    }

    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        let (rising, _, _) = self.edge.update(self.map_state.matches(remote));
        if !rising {
            return;
        }
        self.toggled = !self.toggled;
        if self.toggled {
            add_all(&self.commands, scheduler);
        } else {
            remove_all(&self.commands, scheduler);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use robocmd_kernel::{Command, Subsystem, SubsystemHandle};
    use robocmd_types::{Key, MouseButton, SubsystemId};

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Stub(SubsystemId);

    impl Subsystem for Stub {
        fn id(&self) -> &SubsystemId {
            &self.0
        }
    }

    struct Shot {
        name: String,
        reqs: Vec<SubsystemId>,
        log: Log,
        length: Option<u32>,
        executed: u32,
        ready: Rc<Cell<bool>>,
    }

    impl Command for Shot {
        fn name(&self) -> &str {
            &self.name
        }
        fn requirements(&self) -> &[SubsystemId] {
            &self.reqs
        }
        fn is_ready(&self) -> bool {
            self.ready.get()
        }
        fn initialize(&mut self) {
            self.executed = 0;
            self.log.borrow_mut().push(format!("{}.init", self.name));
        }
        fn execute(&mut self) {
            self.executed += 1;
        }
        fn is_finished(&self) -> bool {
            self.length.is_some_and(|n| self.executed >= n)
        }
        fn end(&mut self, interrupted: bool) {
            self.log
                .borrow_mut()
                .push(format!("{}.end({interrupted})", self.name));
        }
    }

    fn shot(name: &str, length: Option<u32>, log: &Log) -> CommandHandle {
        CommandHandle::new(Shot {
            name: name.to_string(),
            reqs: vec!["agitator".into()],
            log: log.clone(),
            length,
            executed: 0,
            ready: Rc::new(Cell::new(true)),
        })
    }

    fn setup() -> (CommandScheduler, Log) {
        let mut scheduler = CommandScheduler::new();
        scheduler
            .register_subsystem(SubsystemHandle::new(Stub("agitator".into())))
            .unwrap();
        (scheduler, Rc::new(RefCell::new(Vec::new())))
    }

    fn frame(pressed: bool) -> RemoteState {
        RemoteState {
            left_mouse: pressed,
            ..RemoteState::default()
        }
    }

    fn tick(
        mapping: &mut dyn CommandMapping,
        scheduler: &mut CommandScheduler,
        pressed: bool,
    ) {
        mapping.execute_mapping(&frame(pressed), scheduler);
        scheduler.run();
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    fn trigger() -> RemoteMapState {
        RemoteMapState::mouse(MouseButton::Left)
    }

    #[test]
    fn press_fires_once_per_edge() {
        let (mut scheduler, log) = setup();
        let single = shot("single", Some(1), &log);
        let mut mapping = PressMapping::new(trigger(), vec![single]);

        for pressed in [true, true, true, false, true] {
            tick(&mut mapping, &mut scheduler, pressed);
        }
        assert_eq!(
            drain(&log),
            vec!["single.init", "single.end(false)", "single.init", "single.end(false)"]
        );
    }

    #[test]
    fn hold_adds_on_press_and_interrupts_on_release() {
        let (mut scheduler, log) = setup();
        let spin = shot("spin", None, &log);
        let mut mapping = HoldMapping::new(trigger(), vec![spin.clone()]);

        tick(&mut mapping, &mut scheduler, true);
        tick(&mut mapping, &mut scheduler, true);
        assert!(scheduler.is_command_scheduled(&spin));
        tick(&mut mapping, &mut scheduler, false);
        assert!(!scheduler.is_command_scheduled(&spin));
        assert_eq!(drain(&log), vec!["spin.init", "spin.end(true)"]);
    }

    #[test]
    fn hold_does_not_restart_finished_command() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", Some(1), &log);
        let mut mapping = HoldMapping::new(trigger(), vec![burst]);
        for _ in 0..4 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert_eq!(drain(&log), vec!["burst.init", "burst.end(false)"]);
    }

    #[test]
    fn hold_repeat_re_adds_after_natural_finish() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", Some(1), &log);
        let mut mapping = HoldRepeatMapping::new(trigger(), vec![burst.clone()]);
        for _ in 0..3 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert_eq!(
            drain(&log),
            vec![
                "burst.init",
                "burst.end(false)",
                "burst.init",
                "burst.end(false)",
                "burst.init",
                "burst.end(false)"
            ]
        );
        assert_eq!(mapping.schedules_this_press(0), 3);
    }

    #[test]
    fn hold_repeat_respects_max_schedules() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", Some(1), &log);
        let mut mapping = HoldRepeatMapping::new(trigger(), vec![burst]).max_schedules(2);
        for _ in 0..5 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert_eq!(drain(&log).len(), 4);

        // A fresh press resets the budget.
        tick(&mut mapping, &mut scheduler, false);
        tick(&mut mapping, &mut scheduler, true);
        assert_eq!(mapping.schedules_this_press(0), 1);
    }

    #[test]
    fn hold_repeat_cap_can_change_mid_press() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", Some(1), &log);
        let mut mapping = HoldRepeatMapping::new(trigger(), vec![burst]).max_schedules(1);
        for _ in 0..3 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert_eq!(mapping.schedules_this_press(0), 1);

        mapping.set_max_schedules(Some(3));
        for _ in 0..4 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert_eq!(mapping.schedules_this_press(0), 3);

        mapping.set_max_schedules(None);
        tick(&mut mapping, &mut scheduler, true);
        assert_eq!(mapping.schedules_this_press(0), 4);
        drain(&log);
    }

    #[test]
    fn hold_repeat_suspends_after_interruption() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", None, &log);
        let unjam = shot("unjam", Some(1), &log);
        let mut mapping = HoldRepeatMapping::new(trigger(), vec![burst.clone()]);

        tick(&mut mapping, &mut scheduler, true);
        scheduler.add_command(&unjam).unwrap();
        for _ in 0..3 {
            tick(&mut mapping, &mut scheduler, true);
        }
        assert!(!scheduler.is_command_scheduled(&burst));

        tick(&mut mapping, &mut scheduler, false);
        tick(&mut mapping, &mut scheduler, true);
        assert!(scheduler.is_command_scheduled(&burst));
    }

    #[test]
    fn hold_repeat_retries_rejected_add() {
        let (mut scheduler, log) = setup();
        let ready = Rc::new(Cell::new(false));
        let gated = CommandHandle::new(Shot {
            name: "gated".to_string(),
            reqs: vec!["agitator".into()],
            log: log.clone(),
            length: None,
            executed: 0,
            ready: ready.clone(),
        });
        let mut mapping = HoldRepeatMapping::new(trigger(), vec![gated.clone()]);
        tick(&mut mapping, &mut scheduler, true);
        assert!(!scheduler.is_command_scheduled(&gated));

        ready.set(true);
        tick(&mut mapping, &mut scheduler, true);
        assert!(scheduler.is_command_scheduled(&gated));
    }

    #[test]
    fn hold_repeat_can_let_last_repeat_finish() {
        let (mut scheduler, log) = setup();
        let burst = shot("burst", Some(3), &log);
        let mut mapping =
            HoldRepeatMapping::new(trigger(), vec![burst.clone()]).end_when_released(false);
        tick(&mut mapping, &mut scheduler, true);
        tick(&mut mapping, &mut scheduler, false);
        assert!(scheduler.is_command_scheduled(&burst));
        tick(&mut mapping, &mut scheduler, false);
        assert_eq!(drain(&log), vec!["burst.init", "burst.end(false)"]);
    }

    #[test]
    fn toggle_only_flips_on_rising_edge() {
        let (mut scheduler, log) = setup();
        let spin = shot("spin", None, &log);
        let mut mapping = ToggleMapping::new(
            RemoteMapState::new().keys([Key::F]),
            vec![spin.clone()],
        );
        let f = RemoteState {
            keys: [Key::F].into_iter().collect(),
            ..RemoteState::default()
        };
        let none = RemoteState::default();

        let mut history = Vec::new();
        for remote in [&none, &none, &f, &f, &f, &none, &none, &f, &none] {
            mapping.execute_mapping(remote, &mut scheduler);
            scheduler.run();
            history.push(mapping.is_toggled());
        }
        assert_eq!(
            history,
            vec![false, false, true, true, true, true, true, false, false]
        );
        assert!(!scheduler.is_command_scheduled(&spin));
        assert_eq!(drain(&log), vec!["spin.init", "spin.end(true)"]);
    }
}
