//! Launch gating for the standard robot.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use robocmd_control::Governor;

use super::commands::is_aimed_at_target;
use super::launch::FireRateManager;
use super::subsystems::{FrictionWheels, Turret};
use super::world::SharedWorld;

/// Refuses to fire unless at least `buffer` heat remains below the referee
/// limit, and revokes a running fire command once it no longer does.
pub struct HeatLimitGovernor {
    world: SharedWorld,
    buffer: f32,
}

impl HeatLimitGovernor {
    pub fn new(world: SharedWorld, buffer: f32) -> Self {
        Self { world, buffer }
    }
}

impl Governor for HeatLimitGovernor {
    fn name(&self) -> &str {
        "heat_limit"
    }

    fn is_ready(&self) -> bool {
        self.world.borrow().heat_remaining() >= self.buffer
    }
}

pub struct FrictionWheelsOnGovernor {
    wheels: Rc<RefCell<FrictionWheels>>,
}

impl FrictionWheelsOnGovernor {
    pub fn new(wheels: Rc<RefCell<FrictionWheels>>) -> Self {
        Self { wheels }
    }
}

impl Governor for FrictionWheelsOnGovernor {
    fn name(&self) -> &str {
        "friction_wheels_on"
    }

    fn is_ready(&self) -> bool {
        self.wheels.borrow().is_up_to_speed()
    }
}

/// Only lets shots out while the turret is aimed at the vision target.
///
/// The operator can switch the gate off at runtime (`R` on the standard
/// robot), after which it always permits.
pub struct CvOnTargetGovernor {
    world: SharedWorld,
    turret: Rc<RefCell<Turret>>,
    enabled: Cell<bool>,
}

impl CvOnTargetGovernor {
    pub fn new(world: SharedWorld, turret: Rc<RefCell<Turret>>) -> Self {
        Self {
            world,
            turret,
            enabled: Cell::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl Governor for CvOnTargetGovernor {
    fn name(&self) -> &str {
        "cv_on_target"
    }

    fn is_ready(&self) -> bool {
        !self.is_enabled() || is_aimed_at_target(&self.turret.borrow(), &self.world)
    }
}

/// Ends a feed as soon as the referee reports a launch that happened after
/// the feed started.  Never blocks one from starting.
pub struct ProjectileLaunchedGovernor {
    world: SharedWorld,
    baseline: Cell<u32>,
}

impl ProjectileLaunchedGovernor {
    pub fn new(world: SharedWorld) -> Self {
        let baseline = Cell::new(world.borrow().shots_fired);
        Self { world, baseline }
    }
}

impl Governor for ProjectileLaunchedGovernor {
    fn name(&self) -> &str {
        "projectile_launched"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn is_finished(&self) -> bool {
        self.world.borrow().shots_fired > self.baseline.get()
    }

    fn on_governed_command_initialized(&self) {
        self.baseline.set(self.world.borrow().shots_fired);
    }
}

/// Holds the next feed back until the selected launch interval has passed
/// since the last reported launch.  Only gates starting.
pub struct FireRateLimitGovernor {
    world: SharedWorld,
    rate: Rc<FireRateManager>,
}

impl FireRateLimitGovernor {
    pub fn new(world: SharedWorld, rate: Rc<FireRateManager>) -> Self {
        Self { world, rate }
    }
}

impl Governor for FireRateLimitGovernor {
    fn name(&self) -> &str {
        "fire_rate_limit"
    }

    fn is_ready(&self) -> bool {
        let Some(interval) = self.rate.interval_ticks() else {
            return true;
        };
        self.world
            .borrow()
            .ticks_since_launch()
            .is_none_or(|since| since >= interval)
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// A vision target is currently reported.
pub struct TargetAcquiredGovernor {
    world: SharedWorld,
}

impl TargetAcquiredGovernor {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Governor for TargetAcquiredGovernor {
    fn name(&self) -> &str {
        "target_acquired"
    }

    fn is_ready(&self) -> bool {
        self.world.borrow().target_bearing.is_some()
    }
}
