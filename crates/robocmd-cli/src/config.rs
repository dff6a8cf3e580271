//! Configuration vault – reads/writes `~/.robocmd/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persisted settings for the control loop and the standard robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Control-loop period in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Silent ticks before the remote link is declared lost.
    #[serde(default = "default_link_timeout_ticks")]
    pub link_timeout_ticks: u32,

    /// Heat headroom the heat-limit governor keeps below the referee limit.
    #[serde(default = "default_heat_limit_buffer")]
    pub heat_limit_buffer: f32,

    /// Ticks a jam must persist before the agitator switches to unjamming.
    #[serde(default = "default_unjam_delay_ticks")]
    pub unjam_delay_ticks: u32,

    /// Friction wheel setpoint while spinning (m/s launch speed).
    #[serde(default = "default_friction_wheel_speed")]
    pub friction_wheel_speed: f32,

    /// Scenario file to play instead of the bundled one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<PathBuf>,
}

fn default_tick_period_ms() -> u64 {
    2
}
fn default_link_timeout_ticks() -> u32 {
    50
}
fn default_heat_limit_buffer() -> f32 {
    20.0
}
fn default_unjam_delay_ticks() -> u32 {
    25
}
fn default_friction_wheel_speed() -> f32 {
    15.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            link_timeout_ticks: default_link_timeout_ticks(),
            heat_limit_buffer: default_heat_limit_buffer(),
            unjam_delay_ticks: default_unjam_delay_ticks(),
            friction_wheel_speed: default_friction_wheel_speed(),
            scenario: None,
        }
    }
}

impl Config {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

/// Return the path to `~/.robocmd/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".robocmd").join("config.toml")
}

/// Load the config from disk.  `Ok(None)` if the file does not exist.
pub fn load() -> Result<Option<Config>, ConfigError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: Config = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROBOCMD_*` environment variable overrides.  Values that do not
/// parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROBOCMD_TICK_PERIOD_MS` | `tick_period_ms` |
/// | `ROBOCMD_LINK_TIMEOUT_TICKS` | `link_timeout_ticks` |
/// | `ROBOCMD_SCENARIO` | `scenario` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ROBOCMD_TICK_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.tick_period_ms = ms;
    }
    if let Ok(v) = std::env::var("ROBOCMD_LINK_TIMEOUT_TICKS")
        && let Ok(ticks) = v.parse::<u32>()
    {
        cfg.link_timeout_ticks = ticks;
    }
    if let Ok(v) = std::env::var("ROBOCMD_SCENARIO")
        && !v.is_empty()
    {
        cfg.scenario = Some(PathBuf::from(v));
    }
}

/// Save the config, creating `~/.robocmd/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
        // Owner-only directory (rwx------).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
        }
    }
    let raw = toml::to_string_pretty(cfg)?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.tick_period_ms, 2);
        assert_eq!(loaded.link_timeout_ticks, 50);
        assert_eq!(loaded.unjam_delay_ticks, 25);
        assert!(loaded.scenario.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "heat_limit_buffer = 40.0\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.heat_limit_buffer, 40.0);
        assert_eq!(loaded.friction_wheel_speed, 15.0);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_period_ms = \"fast\"\n").expect("write");
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let parent = path.parent().expect("parent");
        let dir_mode = fs::metadata(parent).expect("meta").permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn config_path_points_to_robocmd_dir() {
        let p = config_path_for_home("/home/pilot");
        assert!(p.ends_with(".robocmd/config.toml"));
    }

    #[test]
    fn zero_period_is_clamped_to_one_millisecond() {
        let cfg = Config {
            tick_period_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.tick_period(), Duration::from_millis(1));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        // SAFETY: the only test touching these variables.
        unsafe {
            std::env::set_var("ROBOCMD_TICK_PERIOD_MS", "5");
            std::env::set_var("ROBOCMD_LINK_TIMEOUT_TICKS", "not-a-number");
            std::env::set_var("ROBOCMD_SCENARIO", "/tmp/match.toml");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_period_ms, 5);
        assert_eq!(cfg.link_timeout_ticks, 50);
        assert_eq!(cfg.scenario, Some(PathBuf::from("/tmp/match.toml")));
        unsafe {
            std::env::remove_var("ROBOCMD_TICK_PERIOD_MS");
            std::env::remove_var("ROBOCMD_LINK_TIMEOUT_TICKS");
            std::env::remove_var("ROBOCMD_SCENARIO");
        }
    }
}
