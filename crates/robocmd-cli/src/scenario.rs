//! Scripted input scenarios.
//!
//! A scenario is a TOML list of `[[frame]]` tables.  Each frame holds one
//! remote snapshot for `ticks` control ticks and may override the simulated
//! world when it starts:
//!
//! ```toml
//! name = "opening push"
//!
//! [[frame]]
//! ticks = 200
//! left_switch = "mid"
//! keys = ["W"]
//!
//! [[frame]]
//! ticks = 100
//! right_switch = "up"
//! target_bearing = 0.3
//! heat = 120.0
//!
//! [[frame]]
//! ticks = 80
//! connected = false        # link silence
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use robocmd_runtime::InputSource;
use robocmd_types::RemoteState;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::robot::world::SharedWorld;

/// The scenario played when no other file is configured.
pub const BUNDLED_SCENARIO: &str = include_str!("../scenarios/standard_match.toml");

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("scenario has no frames")]
    Empty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFrame {
    #[serde(default = "one_tick")]
    pub ticks: u32,

    #[serde(flatten)]
    pub remote: RemoteState,

    /// `false` drops the frame entirely, simulating a silent link.
    #[serde(default = "connected")]
    pub connected: bool,

    pub heat: Option<f32>,
    pub target_bearing: Option<f32>,
    #[serde(default)]
    pub target_lost: bool,
    pub agitator_jammed: Option<bool>,
}

fn one_tick() -> u32 {
    1
}

fn connected() -> bool {
    true
}

impl ScenarioFrame {
    fn apply_world(&self, world: &SharedWorld) {
        let mut world = world.borrow_mut();
        if let Some(heat) = self.heat {
            world.heat = heat;
        }
        if let Some(bearing) = self.target_bearing {
            world.target_bearing = Some(bearing);
        }
        if self.target_lost {
            world.target_bearing = None;
        }
        if let Some(jammed) = self.agitator_jammed {
            world.agitator_jammed = jammed;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "frame", default)]
    pub frames: Vec<ScenarioFrame>,
}

impl Scenario {
    pub fn from_toml(raw: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(raw)?;
        if scenario.frames.iter().all(|f| f.ticks == 0) {
            return Err(ScenarioError::Empty);
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn bundled() -> Result<Self, ScenarioError> {
        Self::from_toml(BUNDLED_SCENARIO)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed scenario")
    }

    pub fn total_ticks(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.ticks)).sum()
    }
}

/// Plays a [`Scenario`] one tick per poll and applies world overrides as
/// each frame starts.
pub struct ScenarioInput {
    pending: VecDeque<ScenarioFrame>,
    current: Option<ScenarioFrame>,
    remaining: u32,
    world: SharedWorld,
    started: usize,
}

impl ScenarioInput {
    pub fn new(scenario: Scenario, world: SharedWorld) -> Self {
        info!(
            scenario = scenario.display_name(),
            frames = scenario.frames.len(),
            ticks = scenario.total_ticks(),
            "scenario loaded"
        );
        Self {
            pending: scenario.frames.into_iter().filter(|f| f.ticks > 0).collect(),
            current: None,
            remaining: 0,
            world,
            started: 0,
        }
    }
}

impl InputSource for ScenarioInput {
    fn poll(&mut self) -> Option<RemoteState> {
        if self.remaining == 0 {
            let frame = self.pending.pop_front()?;
            frame.apply_world(&self.world);
            self.remaining = frame.ticks;
            self.started += 1;
            debug!(frame = self.started, ticks = frame.ticks, "scenario frame started");
            self.current = Some(frame);
        }
        self.remaining -= 1;
        let frame = self.current.as_ref()?;
        frame.connected.then(|| frame.remote.clone())
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == 0 && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use robocmd_types::{Key, SwitchState};

    use super::*;
    use crate::robot::world::World;

    const SCRIPT: &str = r#"
        name = "unit"

        [[frame]]
        ticks = 2
        keys = ["W"]
        heat = 50.0

        [[frame]]
        ticks = 0

        [[frame]]
        ticks = 1
        connected = false
        target_bearing = 0.25

        [[frame]]
        right_switch = "up"
        target_lost = true
    "#;

    #[test]
    fn parses_frames_with_defaults() {
        let scenario = Scenario::from_toml(SCRIPT).expect("valid scenario");
        assert_eq!(scenario.display_name(), "unit");
        assert_eq!(scenario.frames.len(), 4);
        assert_eq!(scenario.total_ticks(), 4);
        assert_eq!(scenario.frames[3].ticks, 1);
        assert!(scenario.frames[3].connected);
        assert_eq!(scenario.frames[3].remote.right_switch, SwitchState::Up);
    }

    #[test]
    fn plays_frames_and_world_overrides() {
        let world = World::shared();
        let mut input = ScenarioInput::new(Scenario::from_toml(SCRIPT).expect("valid"), world.clone());

        let first = input.poll().expect("frame");
        assert!(first.key_pressed(Key::W));
        assert_eq!(world.borrow().heat, 50.0);
        assert!(input.poll().is_some());
        assert!(!input.is_exhausted());

        // Silent frame still applies its overrides.
        assert!(input.poll().is_none());
        assert_eq!(world.borrow().target_bearing, Some(0.25));

        let last = input.poll().expect("frame");
        assert_eq!(last.right_switch, SwitchState::Up);
        assert_eq!(world.borrow().target_bearing, None);
        assert!(input.is_exhausted());
        assert!(input.poll().is_none());
    }

    #[test]
    fn empty_scenario_is_rejected() {
        assert!(matches!(
            Scenario::from_toml("name = \"nothing\"\n"),
            Err(ScenarioError::Empty)
        ));
    }

    #[test]
    fn bundled_scenario_parses() {
        let scenario = Scenario::bundled().expect("bundled scenario is valid");
        assert!(scenario.total_ticks() > 0);
        assert!(scenario.frames.iter().any(|f| !f.connected));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = Scenario::load(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ScenarioError::Read { .. })));
    }
}
