//! [`ControlLoop`] – the fixed-period driver that ties input, mappings and
//! the scheduler together.
//!
//! Each tick runs, in order:
//!
//! 1. **Poll** – take the latest frame from the [`InputSource`] into the
//!    shared remote snapshot and feed the [`LinkWatchdog`].
//! 2. **Link** – on timeout enter safe-disconnect (the snapshot is zeroed);
//!    on recovery reconnect.
//! 3. **Map** – evaluate every mapping against the snapshot.
//! 4. **Run** – one [`CommandScheduler::run`].
//!
//! [`ControlLoop::run`] repeats this on a tokio interval.  The loop state is
//! single-threaded (`Rc`), so drive it with `block_on` on a current-thread
//! runtime rather than spawning it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use robocmd_input::{CommandMapper, SharedRemoteState};
use robocmd_kernel::CommandScheduler;
use robocmd_types::RemoteState;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::source::InputSource;
use crate::watchdog::{LinkHealth, LinkWatchdog};

/// Watchdog name of the operator remote link.
pub const REMOTE_LINK: &str = "remote";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControlLoopConfig {
    /// Target tick period.
    pub period: Duration,
    /// Consecutive silent ticks before the remote link is considered lost.
    pub link_timeout_ticks: u32,
    /// Stop after this many ticks (`None` runs until shutdown).
    pub max_ticks: Option<u64>,
    /// Stop once the input source reports it is exhausted.
    pub stop_when_input_exhausted: bool,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(2),
            link_timeout_ticks: 50,
            max_ticks: None,
            stop_when_input_exhausted: false,
        }
    }
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub frame_received: bool,
    pub disconnected: bool,
    pub scheduled: usize,
}

/// Totals reported when [`ControlLoop::run`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub overruns: u64,
    pub link_losses: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlLoop
// ─────────────────────────────────────────────────────────────────────────────

pub struct ControlLoop {
    config: ControlLoopConfig,
    scheduler: CommandScheduler,
    mapper: CommandMapper,
    watchdog: LinkWatchdog,
    remote: SharedRemoteState,
    input: Box<dyn InputSource>,
    ticks: u64,
    link_losses: u64,
}

impl ControlLoop {
    pub fn new(
        config: ControlLoopConfig,
        scheduler: CommandScheduler,
        mapper: CommandMapper,
        remote: SharedRemoteState,
        input: Box<dyn InputSource>,
    ) -> Self {
        let mut watchdog = LinkWatchdog::new();
        watchdog.register(REMOTE_LINK, config.link_timeout_ticks);
        Self {
            config,
            scheduler,
            mapper,
            watchdog,
            remote,
            input,
            ticks: 0,
            link_losses: 0,
        }
    }

    pub fn scheduler(&self) -> &CommandScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut CommandScheduler {
        &mut self.scheduler
    }

    pub fn remote(&self) -> &SharedRemoteState {
        &self.remote
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn link_losses(&self) -> u64 {
        self.link_losses
    }

    /// Run one full tick synchronously.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        self.watchdog.advance();
        let frame = self.input.poll();
        let frame_received = frame.is_some();
        if let Some(frame) = frame {
            *self.remote.borrow_mut() = frame;
            self.watchdog.heartbeat(REMOTE_LINK);
        }

        match self.watchdog.health(REMOTE_LINK) {
            LinkHealth::TimedOut if !self.scheduler.is_disconnected() => {
                warn!(tick = self.ticks, links = ?self.watchdog.check_all(), "input link timed out");
                self.link_losses += 1;
                *self.remote.borrow_mut() = RemoteState::default();
                self.scheduler.safe_disconnect();
            }
            LinkHealth::Healthy if self.scheduler.is_disconnected() => {
                info!(tick = self.ticks, "remote link recovered");
                self.scheduler.reconnect();
            }
            _ => {}
        }

        let snapshot = self.remote.borrow().clone();
        self.mapper.handle_state(&snapshot, &mut self.scheduler);
        self.scheduler.run();

        let report = TickReport {
            tick: self.ticks,
            frame_received,
            disconnected: self.scheduler.is_disconnected(),
            scheduled: self.scheduler.scheduled_count(),
        };
        trace!(?report, "tick complete");
        report
    }

    /// Tick on a fixed-period interval until `shutdown` is set, `max_ticks`
    /// is reached or (optionally) the input is exhausted.  Always finishes
    /// with [`shutdown_safely`](Self::shutdown_safely).
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) -> RunSummary {
        let mut interval = tokio::time::interval(self.config.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut overruns = 0;

        info!(period = ?self.config.period, "control loop started");
        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!(tick = self.ticks, "shutdown requested");
                break;
            }
            if self.config.max_ticks.is_some_and(|max| self.ticks >= max) {
                debug!(tick = self.ticks, "tick limit reached");
                break;
            }
            if self.config.stop_when_input_exhausted && self.input.is_exhausted() {
                debug!(tick = self.ticks, "input exhausted");
                break;
            }

            interval.tick().await;
            let started = Instant::now();
            self.tick();
            let elapsed = started.elapsed();
            if elapsed > self.config.period {
                overruns += 1;
                warn!(tick = self.ticks, ?elapsed, period = ?self.config.period, "tick overran its period");
            }
        }

        self.shutdown_safely();
        RunSummary {
            ticks: self.ticks,
            overruns,
            link_losses: self.link_losses,
        }
    }

    /// Drop every command and run one last tick so subsystems see
    /// `refresh_safe_disconnect`.
    pub fn shutdown_safely(&mut self) {
        self.scheduler.safe_disconnect();
        self.scheduler.run();
        info!(ticks = self.ticks, "control loop stopped safely");
    }
}
