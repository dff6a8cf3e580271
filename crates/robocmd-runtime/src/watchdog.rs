//! [`LinkWatchdog`] – tick-counted liveness of input links.
//!
//! The control loop calls [`LinkWatchdog::heartbeat`] whenever a link
//! delivers a frame and [`LinkWatchdog::advance`] once per tick.  A link that
//! stays silent for `timeout_ticks` consecutive ticks is reported as
//! [`LinkHealth::TimedOut`]; the loop reacts by putting the scheduler into
//! safe-disconnect mode.
//!
//! Deadlines are counted in ticks rather than wall-clock time so behaviour
//! is identical under simulation and on hardware.

use std::collections::HashMap;

/// Health of a single input link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    Healthy,
    TimedOut,
}

struct LinkEntry {
    timeout_ticks: u32,
    silent_ticks: u32,
}

/// # Example
///
/// ```
/// use robocmd_runtime::watchdog::{LinkHealth, LinkWatchdog};
///
/// let mut wd = LinkWatchdog::new();
/// wd.register("remote", 2);
/// wd.advance();
/// assert_eq!(wd.health("remote"), LinkHealth::Healthy);
/// wd.advance();
/// assert_eq!(wd.health("remote"), LinkHealth::TimedOut);
///
/// wd.heartbeat("remote");
/// assert_eq!(wd.health("remote"), LinkHealth::Healthy);
/// ```
#[derive(Default)]
pub struct LinkWatchdog {
    links: HashMap<String, LinkEntry>,
}

impl LinkWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `link` with a silence budget of `timeout_ticks`.  A fresh
    /// link starts healthy; re-registering resets it.
    pub fn register(&mut self, link: &str, timeout_ticks: u32) {
        self.links.insert(
            link.to_string(),
            LinkEntry {
                timeout_ticks,
                silent_ticks: 0,
            },
        );
    }

    /// Record that `link` delivered a frame.  No-op for unknown links.
    pub fn heartbeat(&mut self, link: &str) {
        if let Some(entry) = self.links.get_mut(link) {
            entry.silent_ticks = 0;
        }
    }

    /// Count one tick of silence on every link.
    pub fn advance(&mut self) {
        for entry in self.links.values_mut() {
            entry.silent_ticks = entry.silent_ticks.saturating_add(1);
        }
    }

    /// Health of `link`; unknown links are [`LinkHealth::TimedOut`].
    pub fn health(&self, link: &str) -> LinkHealth {
        match self.links.get(link) {
            Some(entry) if entry.silent_ticks < entry.timeout_ticks => LinkHealth::Healthy,
            _ => LinkHealth::TimedOut,
        }
    }

    /// Names of every timed-out link, sorted.
    pub fn check_all(&self) -> Vec<String> {
        let mut dead: Vec<String> = self
            .links
            .iter()
            .filter(|(_, entry)| entry.silent_ticks >= entry.timeout_ticks)
            .map(|(name, _)| name.clone())
            .collect();
        dead.sort();
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_link_is_healthy() {
        let mut wd = LinkWatchdog::new();
        wd.register("remote", 5);
        assert_eq!(wd.health("remote"), LinkHealth::Healthy);
    }

    #[test]
    fn heartbeat_resets_silence() {
        let mut wd = LinkWatchdog::new();
        wd.register("remote", 3);
        wd.advance();
        wd.advance();
        wd.heartbeat("remote");
        wd.advance();
        wd.advance();
        assert_eq!(wd.health("remote"), LinkHealth::Healthy);
    }

    #[test]
    fn check_all_lists_only_silent_links() {
        let mut wd = LinkWatchdog::new();
        wd.register("remote", 2);
        wd.register("vision", 100);
        wd.register("referee", 1);
        wd.advance();
        wd.advance();
        assert_eq!(wd.check_all(), vec!["referee".to_string(), "remote".to_string()]);
    }

    #[test]
    fn unknown_link_is_timed_out_and_heartbeat_is_noop() {
        let mut wd = LinkWatchdog::new();
        wd.heartbeat("ghost");
        assert_eq!(wd.health("ghost"), LinkHealth::TimedOut);
    }

    #[test]
    fn reregister_resets_deadline() {
        let mut wd = LinkWatchdog::new();
        wd.register("remote", 1);
        wd.advance();
        assert_eq!(wd.health("remote"), LinkHealth::TimedOut);
        wd.register("remote", 10);
        assert_eq!(wd.health("remote"), LinkHealth::Healthy);
    }
}
