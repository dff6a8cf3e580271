//! Subsystems of the standard robot.
//!
//! Each one owns its simulated motors, holds the setpoints commands write,
//! and pushes motor outputs on `refresh()`.  In safe-disconnect mode every
//! actuator is driven to a stop.

use robocmd_hal::{Motor, SimMotor};
use robocmd_kernel::Subsystem;
use robocmd_types::SubsystemId;
use tracing::debug;

use super::world::SharedWorld;

pub const REFEREE: &str = "referee";
pub const CHASSIS: &str = "chassis";
pub const TURRET: &str = "turret";
pub const AGITATOR: &str = "agitator";
pub const FRICTION_WHEELS: &str = "friction_wheels";

fn drive(motor: &mut SimMotor, output: f32) {
    if let Err(e) = motor.set_output(output) {
        debug!(motor = motor.id(), error = %e, "motor output rejected");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Referee
// ─────────────────────────────────────────────────────────────────────────────

/// Stands in for the referee serial link: reports launches and dissipates
/// barrel heat every tick.  No command ever requires it.
pub struct Referee {
    id: SubsystemId,
    world: SharedWorld,
}

impl Referee {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            id: REFEREE.into(),
            world,
        }
    }
}

impl Subsystem for Referee {
    fn id(&self) -> &SubsystemId {
        &self.id
    }

    fn refresh(&mut self) {
        self.world.borrow_mut().referee_tick();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chassis
// ─────────────────────────────────────────────────────────────────────────────

/// Mecanum base.  Inputs are normalised body velocities: `x` forward, `y`
/// left, `r` counter-clockwise.
pub struct Chassis {
    id: SubsystemId,
    wheels: [SimMotor; 4],
    desired: (f32, f32, f32),
}

impl Chassis {
    pub fn new() -> Self {
        Self {
            id: CHASSIS.into(),
            wheels: [
                SimMotor::new("chassis_front_left"),
                SimMotor::new("chassis_front_right"),
                SimMotor::new("chassis_back_left"),
                SimMotor::new("chassis_back_right"),
            ],
            desired: (0.0, 0.0, 0.0),
        }
    }

    pub fn set_desired_output(&mut self, x: f32, y: f32, r: f32) {
        self.desired = (x, y, r);
    }

    pub fn desired_output(&self) -> (f32, f32, f32) {
        self.desired
    }

    /// Front-left, front-right, back-left, back-right.
    pub fn wheel_outputs(&self) -> [f32; 4] {
        [
            self.wheels[0].output(),
            self.wheels[1].output(),
            self.wheels[2].output(),
            self.wheels[3].output(),
        ]
    }

    fn mix(&self) -> [f32; 4] {
        let (x, y, r) = self.desired;
        let raw = [x - y - r, x + y + r, x + y - r, x - y + r];
        let peak = raw.iter().fold(1.0_f32, |m, v| m.max(v.abs()));
        raw.map(|v| v / peak)
    }
}

impl Subsystem for Chassis {
    fn id(&self) -> &SubsystemId {
        &self.id
    }

    fn refresh(&mut self) {
        let outputs = self.mix();
        for (motor, output) in self.wheels.iter_mut().zip(outputs) {
            drive(motor, output);
        }
    }

    fn refresh_safe_disconnect(&mut self) {
        self.desired = (0.0, 0.0, 0.0);
        for motor in &mut self.wheels {
            drive(motor, 0.0);
        }
    }

    fn is_online(&self) -> bool {
        self.wheels.iter().all(|m| m.is_online())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turret
// ─────────────────────────────────────────────────────────────────────────────

/// Proportional gain from angle error (rad) to normalised motor output.
const TURRET_KP: f32 = 4.0;
/// Angle travelled per tick at full output (rad).
const TURRET_MAX_STEP: f32 = 0.02;
pub const PITCH_MIN: f32 = -0.35;
pub const PITCH_MAX: f32 = 0.6;

/// Two-axis gimbal with a position loop.  Yaw is measured relative to the
/// chassis front.
pub struct Turret {
    id: SubsystemId,
    yaw_motor: SimMotor,
    pitch_motor: SimMotor,
    yaw: f32,
    pitch: f32,
    yaw_setpoint: f32,
    pitch_setpoint: f32,
}

impl Turret {
    pub fn new() -> Self {
        Self {
            id: TURRET.into(),
            yaw_motor: SimMotor::new("yaw"),
            pitch_motor: SimMotor::new("pitch"),
            yaw: 0.0,
            pitch: 0.0,
            yaw_setpoint: 0.0,
            pitch_setpoint: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw_setpoint(&self) -> f32 {
        self.yaw_setpoint
    }

    pub fn pitch_setpoint(&self) -> f32 {
        self.pitch_setpoint
    }

    pub fn set_yaw_setpoint(&mut self, yaw: f32) {
        self.yaw_setpoint = yaw;
    }

    pub fn set_pitch_setpoint(&mut self, pitch: f32) {
        self.pitch_setpoint = pitch.clamp(PITCH_MIN, PITCH_MAX);
    }

    fn step(motor: &mut SimMotor, angle: &mut f32, setpoint: f32) {
        drive(motor, (setpoint - *angle) * TURRET_KP);
        *angle += motor.output() * TURRET_MAX_STEP;
    }
}

impl Subsystem for Turret {
    fn id(&self) -> &SubsystemId {
        &self.id
    }

    fn refresh(&mut self) {
        Self::step(&mut self.yaw_motor, &mut self.yaw, self.yaw_setpoint);
        Self::step(&mut self.pitch_motor, &mut self.pitch, self.pitch_setpoint);
    }

    fn refresh_safe_disconnect(&mut self) {
        // Hold position: no new setpoint survives the disconnect.
        self.yaw_setpoint = self.yaw;
        self.pitch_setpoint = self.pitch;
        drive(&mut self.yaw_motor, 0.0);
        drive(&mut self.pitch_motor, 0.0);
    }

    fn is_online(&self) -> bool {
        self.yaw_motor.is_online() && self.pitch_motor.is_online()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agitator
// ─────────────────────────────────────────────────────────────────────────────

/// Feeder travel per tick at full output, in projectiles.
const AGITATOR_STEP: f32 = 0.05;

/// Velocity-controlled feeder.  Position is counted in projectiles: each
/// whole unit of forward travel pushes one ball into the flywheels.  Backing
/// off and feeding the same slot again does not launch it twice.
pub struct Agitator {
    id: SubsystemId,
    motor: SimMotor,
    world: SharedWorld,
    position: f32,
    velocity: f32,
    slots_fed: i64,
}

impl Agitator {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            id: AGITATOR.into(),
            motor: SimMotor::new("agitator"),
            world,
            position: 0.0,
            velocity: 0.0,
            slots_fed: 0,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Trying to feed forward while the mechanism cannot move.
    pub fn is_jammed(&self) -> bool {
        self.velocity > 0.0 && self.world.borrow().agitator_jammed
    }
}

impl Subsystem for Agitator {
    fn id(&self) -> &SubsystemId {
        &self.id
    }

    fn refresh(&mut self) {
        drive(&mut self.motor, self.velocity);
        let blocked = self.motor.output() > 0.0 && self.world.borrow().agitator_jammed;
        if !blocked {
            self.position += self.motor.output() * AGITATOR_STEP;
        }
        let slot = self.position.floor() as i64;
        if slot > self.slots_fed {
            self.world.borrow_mut().queue_launches((slot - self.slots_fed) as u32);
            self.slots_fed = slot;
        }
    }

    fn refresh_safe_disconnect(&mut self) {
        self.velocity = 0.0;
        drive(&mut self.motor, 0.0);
    }

    fn is_online(&self) -> bool {
        self.motor.is_online()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Friction wheels
// ─────────────────────────────────────────────────────────────────────────────

/// Launch speed at full motor output (m/s).
pub const MAX_LAUNCH_SPEED: f32 = 30.0;
/// Speed change per tick while spinning up or down (m/s).
const SPIN_RAMP_PER_TICK: f32 = 0.25;
const UP_TO_SPEED_TOLERANCE: f32 = 0.5;

pub struct FrictionWheels {
    id: SubsystemId,
    left: SimMotor,
    right: SimMotor,
    desired_speed: f32,
    speed: f32,
}

impl FrictionWheels {
    pub fn new() -> Self {
        Self {
            id: FRICTION_WHEELS.into(),
            left: SimMotor::new("left_flywheel"),
            right: SimMotor::new("right_flywheel"),
            desired_speed: 0.0,
            speed: 0.0,
        }
    }

    pub fn set_desired_speed(&mut self, speed: f32) {
        self.desired_speed = speed.clamp(0.0, MAX_LAUNCH_SPEED);
    }

    pub fn desired_speed(&self) -> f32 {
        self.desired_speed
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Spinning at a non-zero setpoint and within tolerance of it.
    pub fn is_up_to_speed(&self) -> bool {
        self.desired_speed > 0.0 && (self.speed - self.desired_speed).abs() <= UP_TO_SPEED_TOLERANCE
    }

    fn ramp(&mut self) {
        let delta = (self.desired_speed - self.speed).clamp(-SPIN_RAMP_PER_TICK, SPIN_RAMP_PER_TICK);
        self.speed += delta;
        let output = self.speed / MAX_LAUNCH_SPEED;
        drive(&mut self.left, output);
        drive(&mut self.right, -output);
    }
}

impl Subsystem for FrictionWheels {
    fn id(&self) -> &SubsystemId {
        &self.id
    }

    fn refresh(&mut self) {
        self.ramp();
    }

    fn refresh_safe_disconnect(&mut self) {
        self.desired_speed = 0.0;
        self.ramp();
    }

    fn is_online(&self) -> bool {
        self.left.is_online() && self.right.is_online()
    }
}
