//! `robocmd` – runs the standard robot against a scripted input scenario.
//!
//! 1. Loads `~/.robocmd/config.toml`, writing a default one on first run.
//! 2. Builds the standard robot (subsystems, commands, governors, mappings).
//! 3. Plays the configured scenario (or the bundled match) through the
//!    fixed-period control loop until it ends or **Ctrl-C** is pressed.
//! 4. Always finishes with a safe disconnect and prints a summary.

mod config;
mod robot;
mod scenario;

use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use robocmd_runtime::{ControlLoop, ControlLoopConfig, RunSummary, init_tracing};
use robocmd_types::RoboError;
use tracing::warn;

use config::Config;
use robot::StandardRobot;
use robot::launch::LaunchModeSelector;
use robot::world::SharedWorld;
use scenario::{Scenario, ScenarioError, ScenarioInput};

fn main() -> ExitCode {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); ROBOCMD_LOG_FORMAT=json for NDJSON.
    // User-facing output below still goes through println!.
    let _telemetry = init_tracing("robocmd");

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – disconnecting safely …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end with its scenario");
    }

    let cfg = load_config();

    let scenario = match load_scenario(&cfg) {
        Ok(s) => s,
        Err(e) => {
            println!("{}: {}", "Scenario error".red(), e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "  Playing {} ({} ticks at {} ms)\n",
        scenario.display_name().bold(),
        scenario.total_ticks(),
        cfg.tick_period().as_millis()
    );

    let mut robot = match build(&cfg, scenario) {
        Ok(r) => r,
        Err(e) => {
            println!("{}: {}", "Robot wiring error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    // Loop state is Rc-based, so it runs on the current thread via block_on.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Runtime error".red(), e);
            return ExitCode::FAILURE;
        }
    };
    let summary = runtime.block_on(robot.control.run(shutdown));

    print_summary(&summary, &robot);
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn load_scenario(cfg: &Config) -> Result<Scenario, ScenarioError> {
    match &cfg.scenario {
        Some(path) => Scenario::load(path),
        None => Scenario::bundled(),
    }
}

/// A wired robot inside its control loop, plus the handles the summary reads.
struct RobotRun {
    control: ControlLoop,
    world: SharedWorld,
    disconnects: Rc<Cell<u32>>,
    launch_mode: Rc<LaunchModeSelector>,
}

fn build(cfg: &Config, scenario: Scenario) -> Result<RobotRun, RoboError> {
    let StandardRobot {
        scheduler,
        mapper,
        remote,
        world,
        disconnects,
        launch_mode,
        ..
    } = StandardRobot::build(cfg)?;

    let input = ScenarioInput::new(scenario, world.clone());
    let loop_config = ControlLoopConfig {
        period: cfg.tick_period(),
        link_timeout_ticks: cfg.link_timeout_ticks,
        max_ticks: None,
        stop_when_input_exhausted: true,
    };
    Ok(RobotRun {
        control: ControlLoop::new(loop_config, scheduler, mapper, remote, Box::new(input)),
        world,
        disconnects,
        launch_mode,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"            __                            __"#.bold().cyan());
    println!("{}", r#"   _______ / /  ___  ______ _  ___  ___/ /"#.bold().cyan());
    println!("{}", r#"  / __/ _ \/ _ \/ _ \/ __/  ' \/ _ \/ _  / "#.bold().cyan());
    println!("{}", r#" /_/  \___/_.__/\___/\__/_/_/_/_//_/\_,_/  "#.bold().cyan());
    println!();
    println!("  {}", "Command-based robot control".dimmed());
    println!();
}

fn print_summary(summary: &RunSummary, run: &RobotRun) {
    let world = run.world.borrow();
    println!();
    println!("{}", "  Run complete".bold().green());
    println!("    ticks          {}", summary.ticks);
    let overruns = summary.overruns.to_string();
    println!(
        "    overruns       {}",
        if summary.overruns == 0 {
            overruns.normal()
        } else {
            overruns.yellow()
        }
    );
    println!("    link losses    {}", summary.link_losses);
    println!("    disconnects    {}", run.disconnects.get());
    println!("    shots fired    {}", world.shots_fired);
    println!("    launch mode    {}", run.launch_mode.mode());
    println!("    barrel heat    {:.1} / {:.0}", world.heat, world.heat_limit);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::launch::LaunchMode;

    #[test]
    fn bundled_match_plays_end_to_end() {
        let cfg = Config::default();
        let scenario = Scenario::bundled().expect("bundled scenario");
        let total = scenario.total_ticks();
        let mut run = build(&cfg, scenario).expect("wiring");

        for _ in 0..total {
            run.control.tick();
        }
        run.control.shutdown_safely();

        assert_eq!(run.control.link_losses(), 1);
        // Once for the link loss, once for shutdown.
        assert_eq!(run.disconnects.get(), 2);
        assert!(run.world.borrow().shots_fired > 0);
        assert_eq!(run.launch_mode.mode(), LaunchMode::Burst);
        assert_eq!(run.control.scheduler().scheduled_count(), 0);
    }

    #[test]
    fn configured_scenario_path_is_used() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("short.toml");
        std::fs::write(&path, "[[frame]]\nticks = 3\n").expect("write");
        let cfg = Config {
            scenario: Some(path),
            ..Config::default()
        };
        let scenario = load_scenario(&cfg).expect("scenario");
        assert_eq!(scenario.total_ticks(), 3);
    }
}
