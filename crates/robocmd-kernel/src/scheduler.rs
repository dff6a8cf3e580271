//! [`CommandScheduler`] – the cooperative, fixed-period run-loop coordinator.
//!
//! The scheduler owns the subsystem → command ownership table and advances
//! every scheduled command once per call to [`CommandScheduler::run`].
//!
//! # Tick order
//!
//! 1. **Refresh** – every registered subsystem, in registration order.
//!    Subsystems reporting `is_online() == false` get
//!    `refresh_safe_disconnect()` instead.
//! 2. **Execute** – every owning command once (ordered by the registration
//!    index of the first subsystem it owns), followed by `is_finished()`;
//!    finished commands get `end(false)` and release their subsystems.
//! 3. **Defaults** – every subsystem left without an owner whose default
//!    command is idle and whose requirements are all free gets that default
//!    scheduled.  It first executes on the next tick.
//!
//! # Lifecycle
//!
//! | State | Observed |
//! |---|---|
//! | `Initializing` | from `add_command` until the command's first `execute` |
//! | `Running` | after its first `execute` while it still owns its subsystems |
//! | `Ending` | from `end()` until the start of the next tick |
//! | `Idle` | otherwise |
//!
//! # Interruption
//!
//! [`add_command`](CommandScheduler::add_command) interrupts every current
//! owner of the new command's requirements (`end(true)`) *before* the new
//! command's `initialize()`, then transfers the whole requirement set in one
//! step.  Partial acquisition never happens.
//!
//! # Safe disconnect
//!
//! When the input link is lost the caller invokes
//! [`safe_disconnect`](CommandScheduler::safe_disconnect).  The registered
//! hook runs once, every remaining command is interrupted, and until
//! [`reconnect`](CommandScheduler::reconnect) new commands are refused,
//! defaults are not scheduled and subsystems are refreshed through
//! `refresh_safe_disconnect()`.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use robocmd_kernel::{Command, CommandHandle, CommandScheduler, Subsystem, SubsystemHandle};
//! use robocmd_types::SubsystemId;
//!
//! struct Chassis(SubsystemId);
//! impl Subsystem for Chassis {
//!     fn id(&self) -> &SubsystemId { &self.0 }
//! }
//!
//! struct Spin { reqs: Vec<SubsystemId>, ticks: u32 }
//! impl Command for Spin {
//!     fn name(&self) -> &str { "spin" }
//!     fn requirements(&self) -> &[SubsystemId] { &self.reqs }
//!     fn execute(&mut self) { self.ticks += 1; }
//!     fn is_finished(&self) -> bool { self.ticks >= 3 }
//! }
//!
//! let mut scheduler = CommandScheduler::new();
//! scheduler.register_subsystem(SubsystemHandle::new(Chassis("chassis".into()))).unwrap();
//!
//! let spin = Rc::new(RefCell::new(Spin { reqs: vec!["chassis".into()], ticks: 0 }));
//! let handle = CommandHandle::from_shared(spin.clone());
//! scheduler.add_command(&handle).unwrap();
//!
//! for _ in 0..3 {
//!     scheduler.run();
//! }
//! assert_eq!(spin.borrow().ticks, 3);
//! assert!(!scheduler.is_command_scheduled(&handle));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use robocmd_types::{CommandState, EndReason, RoboError, SubsystemId};
use tracing::{debug, info, trace, warn};

use crate::command::{Command, CommandHandle, CommandId};
use crate::ownership::OwnershipTable;
use crate::subsystem::SubsystemHandle;

/// Hook invoked once when the input link is judged lost.
pub type SafeDisconnectFn = Box<dyn FnMut(&mut CommandScheduler)>;

// ─────────────────────────────────────────────────────────────────────────────
// Internal entries
// ─────────────────────────────────────────────────────────────────────────────

struct SubsystemEntry {
    handle: SubsystemHandle,
    default_command: Option<CommandHandle>,
    online: bool,
}

struct ScheduledCommand {
    handle: CommandHandle,
    state: CommandState,
}

/// How and when a command last ended.  The weak reference keeps the
/// command's address from being reused while the record exists.
struct EndRecord {
    command: Weak<RefCell<dyn Command>>,
    reason: EndReason,
    tick: u64,
}

impl EndRecord {
    fn is_live(&self) -> bool {
        self.command.strong_count() > 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CommandScheduler
// ─────────────────────────────────────────────────────────────────────────────

pub struct CommandScheduler {
    /// Nested schedulers arbitrate between the children of a comprised
    /// command: no registration, no refresh, no defaults.
    nested: bool,
    subsystems: Vec<SubsystemEntry>,
    ownership: OwnershipTable,
    scheduled: Vec<ScheduledCommand>,
    last_end: HashMap<CommandId, EndRecord>,
    safe_disconnect_fn: Option<SafeDisconnectFn>,
    disconnected: bool,
    ticks: u64,
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandScheduler {
    /// Create the root scheduler for a control loop.
    pub fn new() -> Self {
        Self {
            nested: false,
            subsystems: Vec::new(),
            ownership: OwnershipTable::new(),
            scheduled: Vec::new(),
            last_end: HashMap::new(),
            safe_disconnect_fn: None,
            disconnected: false,
            ticks: 0,
        }
    }

    /// Create a private scheduler for a comprised command's children.
    pub fn nested() -> Self {
        Self {
            nested: true,
            ..Self::new()
        }
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Add a subsystem to the managed set.  Subsystems are refreshed in the
    /// order they were registered.
    ///
    /// # Errors
    ///
    /// [`RoboError::DuplicateSubsystem`] if a subsystem with the same id is
    /// already registered; the scheduler is left unchanged.
    pub fn register_subsystem(&mut self, subsystem: SubsystemHandle) -> Result<(), RoboError> {
        if self.is_subsystem_registered(subsystem.id()) {
            warn!(subsystem = %subsystem.id(), "rejected duplicate subsystem registration");
            return Err(RoboError::DuplicateSubsystem(subsystem.id().clone()));
        }
        info!(subsystem = %subsystem.id(), "subsystem registered");
        self.subsystems.push(SubsystemEntry {
            handle: subsystem,
            default_command: None,
            online: true,
        });
        Ok(())
    }

    pub fn is_subsystem_registered(&self, id: &SubsystemId) -> bool {
        self.subsystems.iter().any(|e| e.handle.id() == id)
    }

    /// Registered subsystem ids in registration order.
    pub fn subsystem_ids(&self) -> Vec<SubsystemId> {
        self.subsystems.iter().map(|e| e.handle.id().clone()).collect()
    }

    /// Assign the command that runs whenever `subsystem` has no owner.
    ///
    /// # Errors
    ///
    /// - [`RoboError::UnregisteredSubsystem`] – `subsystem` is unknown.
    /// - [`RoboError::DefaultCommandMismatch`] – `command` does not require
    ///   `subsystem`.
    pub fn set_default_command(
        &mut self,
        subsystem: &SubsystemId,
        command: CommandHandle,
    ) -> Result<(), RoboError> {
        if !command.requirements().contains(subsystem) {
            warn!(%subsystem, command = %command.name(), "default command does not require its subsystem");
            return Err(RoboError::DefaultCommandMismatch {
                subsystem: subsystem.clone(),
                command: command.name(),
            });
        }
        let Some(entry) = self.subsystems.iter_mut().find(|e| e.handle.id() == subsystem) else {
            warn!(%subsystem, "default command for unregistered subsystem");
            return Err(RoboError::UnregisteredSubsystem(subsystem.clone()));
        };
        info!(%subsystem, command = %command.name(), "default command set");
        entry.default_command = Some(command);
        Ok(())
    }

    pub fn default_command(&self, subsystem: &SubsystemId) -> Option<CommandHandle> {
        self.subsystems
            .iter()
            .find(|e| e.handle.id() == subsystem)
            .and_then(|e| e.default_command.clone())
    }

    /// Register the hook invoked by [`safe_disconnect`](Self::safe_disconnect).
    pub fn set_safe_disconnect_function(&mut self, hook: impl FnMut(&mut CommandScheduler) + 'static) {
        self.safe_disconnect_fn = Some(Box::new(hook));
    }

    // ── Runtime control surface ──────────────────────────────────────────────

    /// Request that `command` start.
    ///
    /// Current owners of any required subsystem are ended with
    /// `interrupted = true` first; then `command` is initialized and takes
    /// ownership of its entire requirement set.  Adding a command that is
    /// already scheduled is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RoboError::Disconnected`] – safe-disconnect mode is active.
    /// - [`RoboError::NoRequirements`] – the command requires nothing.
    /// - [`RoboError::UnregisteredSubsystem`] – a requirement is not
    ///   registered (root scheduler only).
    /// - [`RoboError::NotReady`] – `is_ready()` returned `false`.
    ///
    /// No command is interrupted when an error is returned.
    pub fn add_command(&mut self, command: &CommandHandle) -> Result<(), RoboError> {
        let name = command.name();
        if self.disconnected {
            debug!(command = %name, "rejected while disconnected");
            return Err(RoboError::Disconnected(name));
        }
        let requirements = command.requirements();
        if requirements.is_empty() {
            warn!(command = %name, "command declares no requirements");
            return Err(RoboError::NoRequirements(name));
        }
        if !self.nested
            && let Some(missing) = requirements.iter().find(|r| !self.is_subsystem_registered(r))
        {
            warn!(command = %name, subsystem = %missing, "command requires unregistered subsystem");
            return Err(RoboError::UnregisteredSubsystem(missing.clone()));
        }
        let id = command.id();
        if self.scheduled.iter().any(|c| c.handle.id() == id) {
            trace!(command = %name, "already scheduled");
            return Ok(());
        }
        if !command.borrow().is_ready() {
            debug!(command = %name, "command not ready");
            return Err(RoboError::NotReady(name));
        }

        for owner in self.ownership.owners_of(&requirements) {
            if let Some(displaced) = self.handle_of(owner) {
                debug!(interrupted = %displaced.name(), by = %name, "interrupting owner");
            }
            self.end_command(owner, true);
        }

        self.ownership.acquire_all(&requirements, id)?;
        self.scheduled.push(ScheduledCommand {
            handle: command.clone(),
            state: CommandState::Initializing,
        });
        command.borrow_mut().initialize();
        debug!(command = %name, "command scheduled");
        Ok(())
    }

    /// End `command` early.  Calls `end(interrupted)` and releases every
    /// subsystem it owns; does nothing if it is not scheduled.
    pub fn remove_command(&mut self, command: &CommandHandle, interrupted: bool) {
        let id = command.id();
        if self.scheduled.iter().any(|c| c.handle.id() == id) {
            self.end_command(id, interrupted);
        } else {
            trace!(command = %command.name(), "remove of idle command ignored");
        }
    }

    /// End every scheduled command.
    pub fn remove_all_commands(&mut self, interrupted: bool) {
        let ids: Vec<CommandId> = self.scheduled.iter().map(|c| c.handle.id()).collect();
        for id in ids {
            self.end_command(id, interrupted);
        }
    }

    /// Advance one tick: refresh, execute, finish, defaults.
    pub fn run(&mut self) {
        self.ticks += 1;
        trace!(tick = self.ticks, scheduled = self.scheduled.len(), "scheduler tick");
        self.last_end.retain(|_, record| record.is_live());

        if !self.nested {
            for entry in &mut self.subsystems {
                let mut subsystem = entry.handle.borrow_mut();
                let online = subsystem.is_online();
                if online != entry.online {
                    if online {
                        info!(subsystem = %entry.handle.id(), "subsystem back online");
                    } else {
                        warn!(subsystem = %entry.handle.id(), "subsystem offline, holding safe output");
                    }
                    entry.online = online;
                }
                if self.disconnected || !online {
                    subsystem.refresh_safe_disconnect();
                } else {
                    subsystem.refresh();
                }
            }
        }

        for id in self.execution_order() {
            // An earlier command in this tick cannot remove a later one, but
            // stay robust if a hook ever does.
            let Some(handle) = self.handle_of(id) else {
                continue;
            };
            handle.borrow_mut().execute();
            self.set_state(id, CommandState::Running);
            let finished = handle.borrow().is_finished();
            if finished {
                debug!(command = %handle.name(), "command finished");
                self.end_command(id, false);
            }
        }

        if !self.nested && !self.disconnected {
            self.schedule_default_commands();
        }
    }

    /// Enter safe-disconnect mode.  Invokes the registered hook once, then
    /// interrupts anything the hook left running.  Repeated calls while
    /// already disconnected do nothing.
    pub fn safe_disconnect(&mut self) {
        if self.disconnected {
            return;
        }
        warn!(scheduled = self.scheduled.len(), "input link lost, entering safe disconnect");
        if let Some(mut hook) = self.safe_disconnect_fn.take() {
            hook(self);
            if self.safe_disconnect_fn.is_none() {
                self.safe_disconnect_fn = Some(hook);
            }
        }
        self.disconnected = true;
        self.remove_all_commands(true);
    }

    /// Leave safe-disconnect mode; defaults resume at the end of the next
    /// tick.
    pub fn reconnect(&mut self) {
        if self.disconnected {
            info!("input link restored");
            self.disconnected = false;
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn is_command_scheduled(&self, command: &CommandHandle) -> bool {
        let id = command.id();
        self.scheduled.iter().any(|c| c.handle.id() == id)
    }

    pub fn command_state(&self, command: &CommandHandle) -> CommandState {
        let id = command.id();
        if let Some(entry) = self.scheduled.iter().find(|c| c.handle.id() == id) {
            return entry.state;
        }
        match self.last_end.get(&id) {
            Some(record) if record.tick == self.ticks => CommandState::Ending,
            _ => CommandState::Idle,
        }
    }

    /// How the command's most recent episode ended, if it has run before.
    pub fn last_end_reason(&self, command: &CommandHandle) -> Option<EndReason> {
        self.last_end
            .get(&command.id())
            .filter(|record| record.is_live())
            .map(|record| record.reason)
    }

    /// Handle of the command currently owning `subsystem`.
    pub fn owner_of(&self, subsystem: &SubsystemId) -> Option<CommandHandle> {
        self.ownership
            .owner_of(subsystem)
            .and_then(|id| self.handle_of(id))
    }

    pub fn scheduled_commands(&self) -> Vec<CommandHandle> {
        self.scheduled.iter().map(|c| c.handle.clone()).collect()
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    /// Number of completed calls to [`run`](Self::run).
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn handle_of(&self, id: CommandId) -> Option<CommandHandle> {
        self.scheduled
            .iter()
            .find(|c| c.handle.id() == id)
            .map(|c| c.handle.clone())
    }

    fn set_state(&mut self, id: CommandId, state: CommandState) {
        if let Some(entry) = self.scheduled.iter_mut().find(|c| c.handle.id() == id) {
            entry.state = state;
        }
    }

    fn end_command(&mut self, id: CommandId, interrupted: bool) {
        let Some(handle) = self.handle_of(id) else {
            return;
        };
        self.set_state(id, CommandState::Ending);
        handle.borrow_mut().end(interrupted);
        let freed = self.ownership.release_all(id);
        self.scheduled.retain(|c| c.handle.id() != id);
        self.last_end.insert(
            id,
            EndRecord {
                command: handle.downgrade(),
                reason: EndReason::from_interrupted(interrupted),
                tick: self.ticks,
            },
        );
        trace!(command = %handle.name(), interrupted, freed = freed.len(), "command ended");
    }

    /// Owners in subsystem registration order, then anything else scheduled
    /// in insertion order (the only ordering a nested scheduler has).
    fn execution_order(&self) -> Vec<CommandId> {
        let mut order = Vec::with_capacity(self.scheduled.len());
        for entry in &self.subsystems {
            if let Some(owner) = self.ownership.owner_of(entry.handle.id())
                && !order.contains(&owner)
            {
                order.push(owner);
            }
        }
        for cmd in &self.scheduled {
            let id = cmd.handle.id();
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }

    fn schedule_default_commands(&mut self) {
        for idx in 0..self.subsystems.len() {
            let entry = &self.subsystems[idx];
            if self.ownership.owner_of(entry.handle.id()).is_some() {
                continue;
            }
            let Some(default) = entry.default_command.clone() else {
                continue;
            };
            if self.is_command_scheduled(&default) {
                continue;
            }
            let all_free = default
                .requirements()
                .iter()
                .all(|r| self.ownership.owner_of(r).is_none());
            if !all_free {
                continue;
            }
            if let Err(e) = self.add_command(&default) {
                trace!(command = %default.name(), error = %e, "default command not scheduled");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
