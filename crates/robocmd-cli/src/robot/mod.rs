//! Composition root for the standard robot.
//!
//! [`StandardRobot::build`] wires everything the way a match robot is set
//! up at boot:
//!
//! 1. install the safe-disconnect hook
//! 2. register subsystems (referee, agitator, chassis, turret, friction wheels)
//! 3. set default commands
//! 4. register the remote/keyboard mappings
//!
//! | Input | Mapping | Command |
//! |---|---|---|
//! | right switch down | hold | stop friction wheels |
//! | right switch up | hold-repeat | fire (heat + CV gated) |
//! | left switch down | hold | beyblade |
//! | left switch up | hold | turret CV (user fallback) + chassis drive |
//! | `R` | cycle | CV-on-target gate on/off |
//! | `F` | toggle | beyblade |
//! | left mouse, not `B` | multi-shot | fire (heat + CV gated), per launch mode |
//! | left mouse + `B` | hold-repeat, runs out | fire (wheels and rate gated only) |
//! | right mouse | hold | turret CV (user fallback) |
//! | `Z` | press | turret quick turn |
//! | `Q` xor `E` | press | chassis drive |
//! | `X` | press | chassis autorotate |
//! | `V` | cycle | launch mode single / burst / full-auto |
//!
//! Every fire command feeds until the referee reports one launch, so each
//! hold-repeat scheduling is one projectile.

pub mod commands;
pub mod governors;
pub mod launch;
pub mod subsystems;
pub mod world;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use robocmd_control::{
    GovernorLimitedCommand, GovernorSet, GovernorWithFallbackCommand, TimedSwitchCommand,
};
use robocmd_input::{
    CommandMapper, CycleStateMapping, HoldMapping, HoldRepeatMapping, OperatorInterface,
    PressMapping, RemoteMapState, SharedRemoteState, ToggleMapping,
};
use robocmd_kernel::{CommandHandle, CommandScheduler, SubsystemHandle};
use robocmd_types::{Key, MouseButton, RemoteState, RoboError, Switch, SwitchState};
use tracing::{info, warn};

use crate::config::Config;
use commands::{
    AgitatorMoveCommand, AgitatorUnjamCommand, BeybladeCommand, ChassisAutorotateCommand,
    ChassisDriveCommand, FrictionWheelSpinCommand, TurretCvCommand, TurretQuickTurnCommand,
    TurretUserCommand,
};
use governors::{
    CvOnTargetGovernor, FireRateLimitGovernor, FrictionWheelsOnGovernor, HeatLimitGovernor,
    ProjectileLaunchedGovernor, TargetAcquiredGovernor,
};
use launch::{FireRateManager, LaunchMode, LaunchModeSelector, MultiShotMapping};
use subsystems::{Agitator, CHASSIS, Chassis, FRICTION_WHEELS, FrictionWheels, Referee, TURRET, Turret};
use world::{SharedWorld, World};

/// Every schedulable command of the robot, for inspection and tests.
pub struct StandardCommands {
    pub chassis_drive: CommandHandle,
    pub chassis_autorotate: CommandHandle,
    pub beyblade: CommandHandle,
    pub turret_user: CommandHandle,
    pub turret_cv: CommandHandle,
    pub turret_cv_with_fallback: Rc<RefCell<GovernorWithFallbackCommand>>,
    pub turret_quick_turn: CommandHandle,
    pub spin_friction_wheels: CommandHandle,
    pub stop_friction_wheels: CommandHandle,
    pub move_unjam: Rc<RefCell<TimedSwitchCommand>>,
    pub fire_until_launched: CommandHandle,
    pub fire: CommandHandle,
}

pub struct StandardRobot {
    pub scheduler: CommandScheduler,
    pub mapper: CommandMapper,
    pub remote: SharedRemoteState,
    pub world: SharedWorld,
    pub chassis: Rc<RefCell<Chassis>>,
    pub turret: Rc<RefCell<Turret>>,
    pub agitator: Rc<RefCell<Agitator>>,
    pub friction_wheels: Rc<RefCell<FrictionWheels>>,
    pub cv_on_target: Rc<CvOnTargetGovernor>,
    pub launch_mode: Rc<LaunchModeSelector>,
    pub fire_rate: Rc<FireRateManager>,
    pub commands: StandardCommands,
    /// Times the safe-disconnect hook has fired.
    pub disconnects: Rc<Cell<u32>>,
}

impl StandardRobot {
    /// # Errors
    ///
    /// Any registration error from the scheduler or mapper.  With the fixed
    /// wiring below these only occur if the wiring itself is inconsistent.
    pub fn build(config: &Config) -> Result<Self, RoboError> {
        let remote: SharedRemoteState = Rc::new(RefCell::new(RemoteState::default()));
        let operator = OperatorInterface::new(remote.clone());
        let world = World::shared();

        // ── Subsystems ───────────────────────────────────────────────────
        let chassis = Rc::new(RefCell::new(Chassis::new()));
        let turret = Rc::new(RefCell::new(Turret::new()));
        let agitator = Rc::new(RefCell::new(Agitator::new(world.clone())));
        let friction_wheels = Rc::new(RefCell::new(FrictionWheels::new()));

        // ── Leaf commands ────────────────────────────────────────────────
        let chassis_drive =
            CommandHandle::new(ChassisDriveCommand::new(chassis.clone(), operator.clone()));
        let chassis_autorotate = CommandHandle::new(ChassisAutorotateCommand::new(
            chassis.clone(),
            turret.clone(),
            operator.clone(),
        ));
        let beyblade = CommandHandle::new(BeybladeCommand::new(chassis.clone(), operator.clone()));
        let turret_user = CommandHandle::new(TurretUserCommand::new(turret.clone(), operator));
        let turret_cv = CommandHandle::new(TurretCvCommand::new(turret.clone(), world.clone()));
        let turret_quick_turn = CommandHandle::new(TurretQuickTurnCommand::new(turret.clone()));
        let spin_friction_wheels = CommandHandle::new(FrictionWheelSpinCommand::new(
            "spin_friction_wheels",
            friction_wheels.clone(),
            config.friction_wheel_speed,
        ));
        let stop_friction_wheels = CommandHandle::new(FrictionWheelSpinCommand::new(
            "stop_friction_wheels",
            friction_wheels.clone(),
            0.0,
        ));
        let agitator_move = CommandHandle::new(AgitatorMoveCommand::new(agitator.clone()));
        let agitator_unjam = CommandHandle::new(AgitatorUnjamCommand::new(agitator.clone()));

        // ── Governors ────────────────────────────────────────────────────
        let heat_limit = Rc::new(HeatLimitGovernor::new(world.clone(), config.heat_limit_buffer));
        let wheels_on = Rc::new(FrictionWheelsOnGovernor::new(friction_wheels.clone()));
        let cv_on_target = Rc::new(CvOnTargetGovernor::new(world.clone(), turret.clone()));
        let target_acquired = Rc::new(TargetAcquiredGovernor::new(world.clone()));
        let launched = Rc::new(ProjectileLaunchedGovernor::new(world.clone()));
        let launch_mode = Rc::new(LaunchModeSelector::new());
        let fire_rate = Rc::new(FireRateManager::new(config.tick_period_ms));
        let fire_rate_limit = Rc::new(FireRateLimitGovernor::new(world.clone(), fire_rate.clone()));

        // ── Composite commands ───────────────────────────────────────────
        let jam_source = agitator.clone();
        let move_unjam = Rc::new(RefCell::new(TimedSwitchCommand::new(
            "move_unjam",
            agitator_move,
            agitator_unjam,
            move || jam_source.borrow().is_jammed(),
            config.unjam_delay_ticks,
        )));
        let fire_until_launched = CommandHandle::new(GovernorLimitedCommand::new(
            "fire_until_launched",
            CommandHandle::from_shared(move_unjam.clone()),
            GovernorSet::new()
                .with_shared(launched)
                .with_shared(wheels_on)
                .with_shared(fire_rate_limit),
        ));
        let fire = CommandHandle::new(GovernorLimitedCommand::new(
            "fire",
            fire_until_launched.clone(),
            GovernorSet::new()
                .with_shared(heat_limit)
                .with_shared(cv_on_target.clone()),
        ));
        let turret_cv_with_fallback = Rc::new(RefCell::new(GovernorWithFallbackCommand::new(
            "turret_cv_with_fallback",
            turret_cv.clone(),
            turret_user.clone(),
            GovernorSet::new().with_shared(target_acquired),
        )));
        let cv_or_user = CommandHandle::from_shared(turret_cv_with_fallback.clone());

        // ── Scheduler ────────────────────────────────────────────────────
        let disconnects = Rc::new(Cell::new(0));
        let mut scheduler = CommandScheduler::new();
        let counter = disconnects.clone();
        scheduler.set_safe_disconnect_function(move |_| {
            counter.set(counter.get() + 1);
            warn!("remote disconnected, stopping all actuators");
        });

        scheduler.register_subsystem(SubsystemHandle::new(Referee::new(world.clone())))?;
        scheduler.register_subsystem(SubsystemHandle::from_shared(agitator.clone()))?;
        scheduler.register_subsystem(SubsystemHandle::from_shared(chassis.clone()))?;
        scheduler.register_subsystem(SubsystemHandle::from_shared(turret.clone()))?;
        scheduler.register_subsystem(SubsystemHandle::from_shared(friction_wheels.clone()))?;

        scheduler.set_default_command(&CHASSIS.into(), chassis_autorotate.clone())?;
        scheduler.set_default_command(&TURRET.into(), turret_user.clone())?;
        scheduler.set_default_command(&FRICTION_WHEELS.into(), spin_friction_wheels.clone())?;

        // ── Mappings ─────────────────────────────────────────────────────
        let mut mapper = CommandMapper::new();
        mapper.add_map(Box::new(HoldMapping::new(
            RemoteMapState::switch(Switch::Right, SwitchState::Down),
            vec![stop_friction_wheels.clone()],
        )))?;
        mapper.add_map(Box::new(HoldRepeatMapping::new(
            RemoteMapState::switch(Switch::Right, SwitchState::Up),
            vec![fire.clone()],
        )))?;
        mapper.add_map(Box::new(HoldMapping::new(
            RemoteMapState::switch(Switch::Left, SwitchState::Down),
            vec![beyblade.clone()],
        )))?;
        mapper.add_map(Box::new(HoldMapping::new(
            RemoteMapState::switch(Switch::Left, SwitchState::Up),
            vec![cv_or_user.clone(), chassis_drive.clone()],
        )))?;
        mapper.add_map(Box::new(CycleStateMapping::bound(
            RemoteMapState::new().keys([Key::R]),
            vec![true, false],
            cv_on_target.clone(),
            CvOnTargetGovernor::set_enabled,
        )?))?;
        mapper.add_map(Box::new(ToggleMapping::new(
            RemoteMapState::new().keys([Key::F]),
            vec![beyblade.clone()],
        )))?;
        mapper.add_map(Box::new(MultiShotMapping::new(
            RemoteMapState::mouse(MouseButton::Left).neg_keys([Key::B]),
            fire.clone(),
            launch_mode.clone(),
            fire_rate.clone(),
        )))?;
        mapper.add_map(Box::new(
            HoldRepeatMapping::new(
                RemoteMapState::mouse(MouseButton::Left).keys([Key::B]),
                vec![fire_until_launched.clone()],
            )
            .end_when_released(false),
        ))?;
        mapper.add_map(Box::new(HoldMapping::new(
            RemoteMapState::mouse(MouseButton::Right),
            vec![cv_or_user],
        )))?;
        mapper.add_map(Box::new(PressMapping::new(
            RemoteMapState::new().keys([Key::Z]),
            vec![turret_quick_turn.clone()],
        )))?;
        mapper.add_map(Box::new(PressMapping::new(
            RemoteMapState::new().keys([Key::Q]).neg_keys([Key::E]),
            vec![chassis_drive.clone()],
        )))?;
        mapper.add_map(Box::new(PressMapping::new(
            RemoteMapState::new().keys([Key::E]).neg_keys([Key::Q]),
            vec![chassis_drive.clone()],
        )))?;
        mapper.add_map(Box::new(PressMapping::new(
            RemoteMapState::new().keys([Key::X]),
            vec![chassis_autorotate.clone()],
        )))?;
        mapper.add_map(Box::new(CycleStateMapping::bound(
            RemoteMapState::new().keys([Key::V]),
            LaunchMode::ALL.to_vec(),
            launch_mode.clone(),
            LaunchModeSelector::set_mode,
        )?))?;

        info!(
            subsystems = scheduler.subsystem_ids().len(),
            mappings = mapper.len(),
            "standard robot initialised"
        );

        Ok(Self {
            scheduler,
            mapper,
            remote,
            world,
            chassis,
            turret,
            agitator,
            friction_wheels,
            cv_on_target,
            launch_mode,
            fire_rate,
            commands: StandardCommands {
                chassis_drive,
                chassis_autorotate,
                beyblade,
                turret_user,
                turret_cv,
                turret_cv_with_fallback,
                turret_quick_turn,
                spin_friction_wheels,
                stop_friction_wheels,
                move_unjam,
                fire_until_launched,
                fire,
            },
            disconnects,
        })
    }
}
