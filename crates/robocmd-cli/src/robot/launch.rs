//! Operator-selectable launch modes.
//!
//! `V` cycles a [`LaunchModeSelector`] through [`LaunchMode::ALL`].  The left
//! mouse fire binding is a [`MultiShotMapping`]: a hold-repeat mapping whose
//! per-press shot cap and fire rate follow the selected mode.  Each repeat
//! feeds exactly one projectile, because the fire command ends as soon as the
//! referee reports a launch.
//!
//! | Mode | Shots per press | Rate cap |
//! |------|-----------------|----------|
//! | `Single` | 1 | none |
//! | `Burst` | 3 | 10 Hz |
//! | `FullAuto` | unlimited | 20 Hz |

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use robocmd_input::{CommandMapping, HoldRepeatMapping, MappingKind, RemoteMapState};
use robocmd_kernel::{CommandHandle, CommandScheduler};
use robocmd_types::RemoteState;
use tracing::info;

const BURST_SHOTS: u32 = 3;
const BURST_RATE_HZ: f32 = 10.0;
const FULL_AUTO_RATE_HZ: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    #[default]
    Single,
    Burst,
    FullAuto,
}

impl LaunchMode {
    /// Cycle order, starting from the boot mode.
    pub const ALL: [LaunchMode; 3] = [LaunchMode::Single, LaunchMode::Burst, LaunchMode::FullAuto];

    pub fn shots_per_press(self) -> Option<u32> {
        match self {
            LaunchMode::Single => Some(1),
            LaunchMode::Burst => Some(BURST_SHOTS),
            LaunchMode::FullAuto => None,
        }
    }

    pub fn fire_rate_hz(self) -> Option<f32> {
        match self {
            LaunchMode::Single => None,
            LaunchMode::Burst => Some(BURST_RATE_HZ),
            LaunchMode::FullAuto => Some(FULL_AUTO_RATE_HZ),
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LaunchMode::Single => "single",
            LaunchMode::Burst => "burst",
            LaunchMode::FullAuto => "full-auto",
        };
        f.write_str(s)
    }
}

/// Currently selected launch mode, shared between the `V` cycle and the
/// fire mapping.
#[derive(Debug, Default)]
pub struct LaunchModeSelector {
    mode: Cell<LaunchMode>,
}

impl LaunchModeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: LaunchMode) {
        self.mode.set(mode);
    }
}

/// Minimum spacing between launches, reselected at runtime.  Read by
/// [`FireRateLimitGovernor`](super::governors::FireRateLimitGovernor).
#[derive(Debug)]
pub struct FireRateManager {
    tick_period_ms: u64,
    interval_ticks: Cell<Option<u64>>,
}

impl FireRateManager {
    pub fn new(tick_period_ms: u64) -> Self {
        Self {
            tick_period_ms: tick_period_ms.max(1),
            interval_ticks: Cell::new(None),
        }
    }

    /// `None` (or a non-positive rate) removes the cap.
    pub fn set_fire_rate_hz(&self, hz: Option<f32>) {
        let interval = hz.filter(|hz| *hz > 0.0).map(|hz| {
            let ticks = (1000.0 / (hz * self.tick_period_ms as f32)).ceil() as u64;
            ticks.max(1)
        });
        self.interval_ticks.set(interval);
    }

    pub fn interval_ticks(&self) -> Option<u64> {
        self.interval_ticks.get()
    }
}

/// Hold-repeat fire binding driven by the selected [`LaunchMode`].
pub struct MultiShotMapping {
    inner: HoldRepeatMapping,
    selector: Rc<LaunchModeSelector>,
    rate: Rc<FireRateManager>,
    applied: Option<LaunchMode>,
}

impl MultiShotMapping {
    pub fn new(
        map_state: RemoteMapState,
        fire: CommandHandle,
        selector: Rc<LaunchModeSelector>,
        rate: Rc<FireRateManager>,
    ) -> Self {
        Self {
            inner: HoldRepeatMapping::new(map_state, vec![fire]),
            selector,
            rate,
            applied: None,
        }
    }

    fn apply_mode(&mut self) {
        let mode = self.selector.mode();
        if self.applied == Some(mode) {
            return;
        }
        self.inner.set_max_schedules(mode.shots_per_press());
        self.rate.set_fire_rate_hz(mode.fire_rate_hz());
        info!(
            mode = %mode,
            interval_ticks = ?self.rate.interval_ticks(),
            "launch mode selected"
        );
        self.applied = Some(mode);
    }
}

impl CommandMapping for MultiShotMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::HoldRepeat
    }

    fn map_state(&self) -> &RemoteMapState {
        self.inner.map_state()
    }

    fn commands(&self) -> &[CommandHandle] {
        self.inner.commands()
    }

    fn execute_mapping(&mut self, remote: &RemoteState, scheduler: &mut CommandScheduler) {
        self.apply_mode();
        self.inner.execute_mapping(remote, scheduler);
    }
}
