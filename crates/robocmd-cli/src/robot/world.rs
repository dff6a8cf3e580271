//! Simulated match state the robot cannot command directly: barrel heat and
//! launches as reported by the referee system, the vision target and feeder
//! jams.  Scenario frames write into it; subsystems and governors read it.
//!
//! The agitator queues projectiles it pushes into the flywheels; the referee
//! reports them one tick later, the way the real referee serial link lags
//! the mechanism.

use std::cell::RefCell;
use std::rc::Rc;

pub type SharedWorld = Rc<RefCell<World>>;

/// Referee heat limit for a 17 mm barrel.
pub const DEFAULT_HEAT_LIMIT: f32 = 240.0;
/// Heat dissipated per control tick.
pub const DEFAULT_COOLING_PER_TICK: f32 = 0.08;
/// Heat added by each launched projectile.
pub const DEFAULT_HEAT_PER_SHOT: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub heat: f32,
    pub heat_limit: f32,
    pub cooling_per_tick: f32,
    pub heat_per_shot: f32,
    /// Bearing of the vision target relative to the chassis, in radians.
    pub target_bearing: Option<f32>,
    pub agitator_jammed: bool,
    /// Launches reported by the referee so far.
    pub shots_fired: u32,
    /// Projectiles fed but not yet reported.
    pub pending_launches: u32,
    /// Referee ticks elapsed.
    pub tick: u64,
    pub last_launch_tick: Option<u64>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            heat: 0.0,
            heat_limit: DEFAULT_HEAT_LIMIT,
            cooling_per_tick: DEFAULT_COOLING_PER_TICK,
            heat_per_shot: DEFAULT_HEAT_PER_SHOT,
            target_bearing: None,
            agitator_jammed: false,
            shots_fired: 0,
            pending_launches: 0,
            tick: 0,
            last_launch_tick: None,
        }
    }
}

impl World {
    pub fn shared() -> SharedWorld {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn heat_remaining(&self) -> f32 {
        self.heat_limit - self.heat
    }

    fn record_shot(&mut self) {
        self.shots_fired += 1;
        self.heat += self.heat_per_shot;
        self.last_launch_tick = Some(self.tick);
    }

    pub fn queue_launches(&mut self, count: u32) {
        self.pending_launches += count;
    }

    /// One referee update: advance the clock, report queued launches, cool
    /// the barrel.
    pub fn referee_tick(&mut self) {
        self.tick += 1;
        for _ in 0..std::mem::take(&mut self.pending_launches) {
            self.record_shot();
        }
        self.cool();
    }

    pub fn cool(&mut self) {
        self.heat = (self.heat - self.cooling_per_tick).max(0.0);
    }

    /// Ticks since the last reported launch, if there was one.
    pub fn ticks_since_launch(&self) -> Option<u64> {
        self.last_launch_tick.map(|t| self.tick - t)
    }
}
