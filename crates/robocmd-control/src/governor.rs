//! [`Governor`] – a runtime permission predicate for gated commands.
//!
//! A governor answers two questions about the current world state:
//!
//! | Method | Meaning |
//! |--------|---------|
//! | [`Governor::is_ready`] | the gated command may **start** |
//! | [`Governor::is_finished`] | the gated command must **stop** now |
//!
//! `is_finished` defaults to `!is_ready`, which gives the plain
//! single-predicate behaviour.  Governors only read shared state; they never
//! touch the scheduler.  A governor that needs a per-episode baseline (for
//! example "a projectile has launched since the command started") takes it in
//! [`Governor::on_governed_command_initialized`].
//!
//! Governors are shared between several gated commands (the heat governor
//! gates both the single-shot and the rapid-fire command), so they are held
//! as `Rc<dyn Governor>` inside a [`GovernorSet`].

use std::fmt;
use std::rc::Rc;

// ────────────────────────────────────────────────────────────────────────────
// Governor trait
// ────────────────────────────────────────────────────────────────────────────

pub trait Governor {
    /// Name used in denial logs.
    fn name(&self) -> &str;

    /// Whether a gated command may be scheduled.
    fn is_ready(&self) -> bool;

    /// Whether a running gated command must be ended.
    fn is_finished(&self) -> bool {
        !self.is_ready()
    }

    /// Called when a command gated by this governor is initialized.
    fn on_governed_command_initialized(&self) {}
}

// ────────────────────────────────────────────────────────────────────────────
// GovernorSet
// ────────────────────────────────────────────────────────────────────────────

/// Ordered conjunction of governors.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use robocmd_control::{FnGovernor, GovernorSet};
///
/// let heat_ok = Rc::new(Cell::new(true));
/// let flag = heat_ok.clone();
/// let set = GovernorSet::new().with(FnGovernor::new("heat", move || flag.get()));
///
/// assert!(set.all_ready());
/// heat_ok.set(false);
/// assert_eq!(set.first_finished(), Some("heat"));
/// ```
#[derive(Clone, Default)]
pub struct GovernorSet {
    governors: Vec<Rc<dyn Governor>>,
}

impl GovernorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, governor: impl Governor + 'static) -> Self {
        self.push(Rc::new(governor));
        self
    }

    /// Builder-style [`push`](Self::push) for a governor that is shared with
    /// other sets.
    pub fn with_shared(mut self, governor: Rc<dyn Governor>) -> Self {
        self.push(governor);
        self
    }

    pub fn push(&mut self, governor: Rc<dyn Governor>) {
        self.governors.push(governor);
    }

    /// `true` when every governor is ready (vacuously true when empty).
    pub fn all_ready(&self) -> bool {
        self.governors.iter().all(|g| g.is_ready())
    }

    /// `true` when any governor demands a stop.
    pub fn any_finished(&self) -> bool {
        self.first_finished().is_some()
    }

    /// Name of the first governor (in insertion order) demanding a stop.
    pub fn first_finished(&self) -> Option<&str> {
        self.governors
            .iter()
            .find(|g| g.is_finished())
            .map(|g| g.name())
    }

    /// Tell every governor that the command it gates has started.
    pub fn notify_initialized(&self) {
        for governor in &self.governors {
            governor.on_governed_command_initialized();
        }
    }

    pub fn len(&self) -> usize {
        self.governors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.governors.is_empty()
    }
}

impl fmt::Debug for GovernorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.governors.iter().map(|g| g.name()))
            .finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FnGovernor
// ────────────────────────────────────────────────────────────────────────────

/// Adapts a closure into a [`Governor`] with `is_finished = !is_ready`.
pub struct FnGovernor<F> {
    name: String,
    predicate: F,
}

impl<F: Fn() -> bool> FnGovernor<F> {
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F: Fn() -> bool> Governor for FnGovernor<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        (self.predicate)()
    }
}
