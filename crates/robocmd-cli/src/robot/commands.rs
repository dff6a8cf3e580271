//! Leaf commands of the standard robot.  Composite behaviour (gating,
//! fallback, move/unjam) is assembled from these in `robot::build`.

use std::cell::RefCell;
use std::f32::consts::PI;
use std::rc::Rc;

use robocmd_input::OperatorInterface;
use robocmd_kernel::Command;
use robocmd_types::SubsystemId;

use super::subsystems::{AGITATOR, Agitator, CHASSIS, Chassis, FRICTION_WHEELS, FrictionWheels, TURRET, Turret};
use super::world::SharedWorld;

/// Chassis rotation per radian of turret yaw while autorotating.
const AUTOROTATE_KP: f32 = 1.5;
const BEYBLADE_ROTATION: f32 = 0.7;
const BEYBLADE_TRANSLATION_SCALAR: f32 = 0.5;
const USER_YAW_INPUT_SCALAR: f32 = 0.02;
const USER_PITCH_INPUT_SCALAR: f32 = 0.01;
/// Yaw error (rad) under which the turret counts as aimed at the target.
pub const AIM_TOLERANCE: f32 = 0.05;
/// Feeder travel for one shot, with overshoot past the launch slot.  The
/// referee normally reports the launch first and a governor ends the move.
const ROTATE_DISPLACEMENT: f32 = 1.25;
const MOVE_VELOCITY: f32 = 1.0;
const UNJAM_VELOCITY: f32 = 0.5;

// ─────────────────────────────────────────────────────────────────────────────
// Chassis
// ─────────────────────────────────────────────────────────────────────────────

/// Operator translation and rotation straight through to the chassis.
pub struct ChassisDriveCommand {
    requirements: Vec<SubsystemId>,
    chassis: Rc<RefCell<Chassis>>,
    operator: OperatorInterface,
}

impl ChassisDriveCommand {
    pub fn new(chassis: Rc<RefCell<Chassis>>, operator: OperatorInterface) -> Self {
        Self {
            requirements: vec![CHASSIS.into()],
            chassis,
            operator,
        }
    }
}

impl Command for ChassisDriveCommand {
    fn name(&self) -> &str {
        "chassis_drive"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self) {
        self.chassis.borrow_mut().set_desired_output(
            self.operator.chassis_x_input(),
            self.operator.chassis_y_input(),
            self.operator.chassis_r_input(),
        );
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool) {
        self.chassis.borrow_mut().set_desired_output(0.0, 0.0, 0.0);
    }
}

/// Operator translation; rotation turns the chassis to face the turret.
pub struct ChassisAutorotateCommand {
    requirements: Vec<SubsystemId>,
    chassis: Rc<RefCell<Chassis>>,
    turret: Rc<RefCell<Turret>>,
    operator: OperatorInterface,
}

impl ChassisAutorotateCommand {
    pub fn new(
        chassis: Rc<RefCell<Chassis>>,
        turret: Rc<RefCell<Turret>>,
        operator: OperatorInterface,
    ) -> Self {
        Self {
            requirements: vec![CHASSIS.into()],
            chassis,
            turret,
            operator,
        }
    }
}

impl Command for ChassisAutorotateCommand {
    fn name(&self) -> &str {
        "chassis_autorotate"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self) {
        let r = (self.turret.borrow().yaw() * AUTOROTATE_KP).clamp(-1.0, 1.0);
        self.chassis.borrow_mut().set_desired_output(
            self.operator.chassis_x_input(),
            self.operator.chassis_y_input(),
            r,
        );
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool) {
        self.chassis.borrow_mut().set_desired_output(0.0, 0.0, 0.0);
    }
}

/// Constant spin with reduced translation.
pub struct BeybladeCommand {
    requirements: Vec<SubsystemId>,
    chassis: Rc<RefCell<Chassis>>,
    operator: OperatorInterface,
}

impl BeybladeCommand {
    pub fn new(chassis: Rc<RefCell<Chassis>>, operator: OperatorInterface) -> Self {
        Self {
            requirements: vec![CHASSIS.into()],
            chassis,
            operator,
        }
    }
}

impl Command for BeybladeCommand {
    fn name(&self) -> &str {
        "beyblade"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self) {
        self.chassis.borrow_mut().set_desired_output(
            self.operator.chassis_x_input() * BEYBLADE_TRANSLATION_SCALAR,
            self.operator.chassis_y_input() * BEYBLADE_TRANSLATION_SCALAR,
            BEYBLADE_ROTATION,
        );
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool) {
        self.chassis.borrow_mut().set_desired_output(0.0, 0.0, 0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turret
// ─────────────────────────────────────────────────────────────────────────────

/// Mouse and right stick nudge the turret setpoints.
pub struct TurretUserCommand {
    requirements: Vec<SubsystemId>,
    turret: Rc<RefCell<Turret>>,
    operator: OperatorInterface,
}

impl TurretUserCommand {
    pub fn new(turret: Rc<RefCell<Turret>>, operator: OperatorInterface) -> Self {
        Self {
            requirements: vec![TURRET.into()],
            turret,
            operator,
        }
    }
}

impl Command for TurretUserCommand {
    fn name(&self) -> &str {
        "turret_user"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self) {
        let mut turret = self.turret.borrow_mut();
        let yaw = turret.yaw_setpoint() + self.operator.turret_yaw_input() * USER_YAW_INPUT_SCALAR;
        let pitch =
            turret.pitch_setpoint() + self.operator.turret_pitch_input() * USER_PITCH_INPUT_SCALAR;
        turret.set_yaw_setpoint(yaw);
        turret.set_pitch_setpoint(pitch);
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// Slews the turret onto the vision target.  Not ready without a target.
pub struct TurretCvCommand {
    requirements: Vec<SubsystemId>,
    turret: Rc<RefCell<Turret>>,
    world: SharedWorld,
}

impl TurretCvCommand {
    pub fn new(turret: Rc<RefCell<Turret>>, world: SharedWorld) -> Self {
        Self {
            requirements: vec![TURRET.into()],
            turret,
            world,
        }
    }
}

impl Command for TurretCvCommand {
    fn name(&self) -> &str {
        "turret_cv"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.world.borrow().target_bearing.is_some()
    }

    fn execute(&mut self) {
        if let Some(bearing) = self.world.borrow().target_bearing {
            self.turret.borrow_mut().set_yaw_setpoint(bearing);
        }
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// Whether the turret yaw is within [`AIM_TOLERANCE`] of the vision target.
pub fn is_aimed_at_target(turret: &Turret, world: &SharedWorld) -> bool {
    world
        .borrow()
        .target_bearing
        .is_some_and(|bearing| (bearing - turret.yaw()).abs() <= AIM_TOLERANCE)
}

/// Flip the yaw setpoint by half a turn.  Finishes after one tick.
pub struct TurretQuickTurnCommand {
    requirements: Vec<SubsystemId>,
    turret: Rc<RefCell<Turret>>,
}

impl TurretQuickTurnCommand {
    pub fn new(turret: Rc<RefCell<Turret>>) -> Self {
        Self {
            requirements: vec![TURRET.into()],
            turret,
        }
    }
}

impl Command for TurretQuickTurnCommand {
    fn name(&self) -> &str {
        "turret_quick_turn"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self) {
        let mut turret = self.turret.borrow_mut();
        let yaw = turret.yaw_setpoint() + PI;
        turret.set_yaw_setpoint(yaw);
    }

    fn execute(&mut self) {}

    fn is_finished(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agitator
// ─────────────────────────────────────────────────────────────────────────────

/// Rotate the feeder one slot forward.  Whether a projectile actually left
/// the barrel is the referee's call, not this command's.
pub struct AgitatorMoveCommand {
    requirements: Vec<SubsystemId>,
    agitator: Rc<RefCell<Agitator>>,
    target: f32,
}

impl AgitatorMoveCommand {
    pub fn new(agitator: Rc<RefCell<Agitator>>) -> Self {
        Self {
            requirements: vec![AGITATOR.into()],
            agitator,
            target: 0.0,
        }
    }
}

impl Command for AgitatorMoveCommand {
    fn name(&self) -> &str {
        "agitator_move"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self) {
        self.target = self.agitator.borrow().position() + ROTATE_DISPLACEMENT;
    }

    fn execute(&mut self) {
        self.agitator.borrow_mut().set_velocity(MOVE_VELOCITY);
    }

    fn is_finished(&self) -> bool {
        self.agitator.borrow().position() >= self.target
    }

    fn end(&mut self, _interrupted: bool) {
        self.agitator.borrow_mut().set_velocity(0.0);
    }
}

/// Back the feeder off until something else takes over.
pub struct AgitatorUnjamCommand {
    requirements: Vec<SubsystemId>,
    agitator: Rc<RefCell<Agitator>>,
}

impl AgitatorUnjamCommand {
    pub fn new(agitator: Rc<RefCell<Agitator>>) -> Self {
        Self {
            requirements: vec![AGITATOR.into()],
            agitator,
        }
    }
}

impl Command for AgitatorUnjamCommand {
    fn name(&self) -> &str {
        "agitator_unjam"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self) {
        self.agitator.borrow_mut().set_velocity(-UNJAM_VELOCITY);
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool) {
        self.agitator.borrow_mut().set_velocity(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Friction wheels
// ─────────────────────────────────────────────────────────────────────────────

/// Hold the flywheels at a fixed launch speed (zero to stop them).
pub struct FrictionWheelSpinCommand {
    name: &'static str,
    requirements: Vec<SubsystemId>,
    wheels: Rc<RefCell<FrictionWheels>>,
    speed: f32,
}

impl FrictionWheelSpinCommand {
    pub fn new(name: &'static str, wheels: Rc<RefCell<FrictionWheels>>, speed: f32) -> Self {
        Self {
            name,
            requirements: vec![FRICTION_WHEELS.into()],
            wheels,
            speed,
        }
    }
}

impl Command for FrictionWheelSpinCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self) {
        self.wheels.borrow_mut().set_desired_speed(self.speed);
    }

    fn execute(&mut self) {
        self.wheels.borrow_mut().set_desired_speed(self.speed);
    }

    fn is_finished(&self) -> bool {
        false
    }
}
